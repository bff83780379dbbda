use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fractalpaper",
    author,
    version,
    about = "Animated Mandelbrot wallpaper rendered by a three-stage GPU pipeline"
)]
pub struct Cli {
    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "1280x720")]
    pub size: String,

    /// Target frame rate; also the step of the animation clock.
    #[arg(long, value_name = "FPS", value_parser = parse_fps, default_value_t = 60.0)]
    pub fps: f32,

    /// Box-blur radius for the filter stage.
    #[arg(long, value_name = "PIXELS", value_parser = parse_radius, default_value_t = 6)]
    pub radius: u32,

    /// Escape-time iteration cap for the generator stage (even, 4-4096).
    #[arg(long, value_name = "COUNT", value_parser = parse_iterations, default_value_t = 128)]
    pub max_iterations: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err("frame rate must be a positive number".to_string());
    }
    if fps > 480.0 {
        return Err(format!("frame rate {fps} is unreasonably high; maximum is 480"));
    }
    Ok(fps)
}

pub fn parse_radius(value: &str) -> Result<u32, String> {
    let radius: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid blur radius '{value}'"))?;
    if !(1..=32).contains(&radius) {
        return Err(format!("blur radius {radius} out of range; expected 1-32"));
    }
    Ok(radius)
}

pub fn parse_iterations(value: &str) -> Result<u32, String> {
    let iterations: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid iteration cap '{value}'"))?;
    if !(4..=4096).contains(&iterations) {
        return Err(format!(
            "iteration cap {iterations} out of range; expected 4-4096"
        ));
    }
    // The palette splits the count range at the midpoint.
    if iterations % 2 != 0 {
        return Err(format!("iteration cap {iterations} must be even"));
    }
    Ok(iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_and_negative() {
        assert!(parse_fps("0").is_err());
        assert!(parse_fps("-30").is_err());
        assert!(parse_fps("nan").is_err());
    }

    #[test]
    fn fps_accepts_common_rates() {
        assert_eq!(parse_fps("60"), Ok(60.0));
        assert_eq!(parse_fps("29.97"), Ok(29.97));
        assert_eq!(parse_fps(" 144 "), Ok(144.0));
    }

    #[test]
    fn radius_enforces_range() {
        assert!(parse_radius("0").is_err());
        assert!(parse_radius("33").is_err());
        assert_eq!(parse_radius("6"), Ok(6));
        assert_eq!(parse_radius("32"), Ok(32));
    }

    #[test]
    fn iterations_must_be_even_and_in_range() {
        assert!(parse_iterations("3").is_err());
        assert!(parse_iterations("127").is_err());
        assert!(parse_iterations("8192").is_err());
        assert_eq!(parse_iterations("128"), Ok(128));
        assert_eq!(parse_iterations("4"), Ok(4));
    }
}
