pub(crate) mod canvas;
pub(crate) mod context;
pub(crate) mod frame;
pub(crate) mod params;
pub(crate) mod pipeline;
pub(crate) mod state;
