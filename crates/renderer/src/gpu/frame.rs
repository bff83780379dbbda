//! Per-frame stage sequencing.
//!
//! Every frame walks the same fixed protocol: generator, canvas commit,
//! filter, canvas commit, presenter. The commits are the explicit
//! synchronization points that make the previous kernel's canvas writes
//! visible to the next stage; skipping one lets the filter read texels the
//! generator has not finished writing. [`drive_frame`] owns the ordering so
//! the GPU encoder and the test double both follow it exactly.

use crate::shaders::WORKGROUP_DIM;

/// One step of the frame protocol. `next` encodes the only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameStage {
    Idle,
    GeneratorDispatch,
    GeneratorBarrier,
    FilterDispatch,
    FilterBarrier,
    PresenterDispatch,
}

impl FrameStage {
    pub(crate) fn next(self) -> Self {
        match self {
            Self::Idle => Self::GeneratorDispatch,
            Self::GeneratorDispatch => Self::GeneratorBarrier,
            Self::GeneratorBarrier => Self::FilterDispatch,
            Self::FilterDispatch => Self::FilterBarrier,
            Self::FilterBarrier => Self::PresenterDispatch,
            Self::PresenterDispatch => Self::Idle,
        }
    }
}

/// Stage operations a frame driver must provide.
pub(crate) trait StagePasses {
    /// Dispatches the escape-time kernel over every canvas pixel.
    fn generate(&mut self);
    /// Commits pending canvas writes so the next stage observes them.
    fn commit_canvas(&mut self);
    /// Dispatches the in-place box blur over every canvas pixel.
    fn filter(&mut self);
    /// Draws the canvas to the display surface.
    fn present(&mut self);
}

/// Runs one full frame through the stage protocol.
pub(crate) fn drive_frame<P: StagePasses>(passes: &mut P) {
    let mut stage = FrameStage::Idle;
    loop {
        stage = stage.next();
        match stage {
            FrameStage::Idle => break,
            FrameStage::GeneratorDispatch => passes.generate(),
            FrameStage::GeneratorBarrier | FrameStage::FilterBarrier => passes.commit_canvas(),
            FrameStage::FilterDispatch => passes.filter(),
            FrameStage::PresenterDispatch => passes.present(),
        }
    }
}

/// Workgroup counts covering a canvas, ceil-divided by the tile size so
/// partial edge tiles are still dispatched (the kernels bounds-check).
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchGrid {
    pub x: u32,
    pub y: u32,
}

impl DispatchGrid {
    pub(crate) fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            x: width.div_ceil(WORKGROUP_DIM),
            y: height.div_ceil(WORKGROUP_DIM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingPasses {
        calls: Vec<&'static str>,
    }

    impl StagePasses for RecordingPasses {
        fn generate(&mut self) {
            self.calls.push("generate");
        }
        fn commit_canvas(&mut self) {
            self.calls.push("commit");
        }
        fn filter(&mut self) {
            self.calls.push("filter");
        }
        fn present(&mut self) {
            self.calls.push("present");
        }
    }

    #[test]
    fn frame_runs_stages_with_a_commit_between_each_kernel() {
        let mut passes = RecordingPasses { calls: Vec::new() };
        drive_frame(&mut passes);
        assert_eq!(
            passes.calls,
            vec!["generate", "commit", "filter", "commit", "present"]
        );
    }

    #[test]
    fn stage_order_cycles_back_to_idle_in_six_steps() {
        let mut stage = FrameStage::Idle;
        for _ in 0..6 {
            stage = stage.next();
        }
        assert_eq!(stage, FrameStage::Idle);
    }

    #[test]
    fn dispatch_grid_covers_the_whole_canvas() {
        let grid = DispatchGrid::for_canvas(1280, 720);
        assert!(grid.x * WORKGROUP_DIM >= 1280);
        assert!(grid.y * WORKGROUP_DIM >= 720);

        // Sizes that are not tile multiples round up, never down.
        let ragged = DispatchGrid::for_canvas(1281, 721);
        assert_eq!(ragged.x, 161);
        assert_eq!(ragged.y, 91);
    }

    #[test]
    fn dispatch_grid_handles_a_single_pixel() {
        let grid = DispatchGrid::for_canvas(1, 1);
        assert_eq!((grid.x, grid.y), (1, 1));
    }
}
