use anyhow::Result;
use renderer::{Renderer, RendererConfig, Tuning};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let surface_size = parse_surface_size(&args.size)?;
    let config = RendererConfig {
        surface_size,
        target_fps: args.fps,
        tuning: Tuning {
            max_iterations: args.max_iterations,
            blur_radius: args.radius,
            ..Tuning::default()
        },
    };

    tracing::info!(
        size = %format!("{}x{}", surface_size.0, surface_size.1),
        fps = args.fps,
        radius = args.radius,
        max_iterations = args.max_iterations,
        "starting fractalpaper"
    );

    Renderer::new(config).run()
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_common_forms() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 1920 X 1080 ").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size("640×480").unwrap(), (640, 480));
    }

    #[test]
    fn size_rejects_malformed_specs() {
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("1280x").is_err());
        assert!(parse_surface_size("wide x tall").is_err());
    }
}
