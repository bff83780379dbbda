use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::error::RendererError;
use crate::gpu::state::GpuState;
use crate::runtime::{FrameClock, FramePacer};
use crate::types::RendererConfig;

/// Opens the window, builds the GPU state, and runs the event loop until the
/// window closes, Escape is pressed, or a device fault makes continuing
/// impossible.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("fractalpaper")
        .with_inner_size(window_size)
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut gpu = GpuState::new(window.as_ref(), window_size, &config.tuning)?;
    let mut clock = FrameClock::new(config.target_fps);
    let mut pacer = FramePacer::new(config.target_fps);

    info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        fps = config.target_fps,
        "renderer started"
    );

    // Device faults surface inside the event loop closure; park them here so
    // the process can exit non-zero.
    let fatal: Rc<RefCell<Option<RendererError>>> = Rc::new(RefCell::new(None));
    let fatal_slot = fatal.clone();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                    {
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(_) => {
                    // The window is fixed-size; compositors may still report
                    // a resize at map time. The canvas keeps its startup
                    // dimensions, only the swapchain is refreshed.
                    gpu.reconfigure_surface();
                }
                WindowEvent::RedrawRequested => match gpu.render(clock.seconds()) {
                    Ok(()) => {
                        clock.advance();
                        pacer.mark_rendered(Instant::now());
                    }
                    Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                        gpu.reconfigure_surface();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; exiting");
                        *fatal_slot.borrow_mut() = Some(RendererError::DeviceError {
                            operation: "acquire frame",
                            detail: "surface out of memory".into(),
                        });
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!(error = ?other, "surface error; retrying next frame");
                    }
                },
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if pacer.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = pacer.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))?;

    drain_fatal(&fatal)
}

/// Takes a device fault recorded by the event loop, if any. Works through
/// the shared cell so a still-live clone of the handle cannot swallow the
/// fault.
fn drain_fatal(fatal: &RefCell<Option<RendererError>>) -> Result<()> {
    match fatal.borrow_mut().take() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_device_fault_surfaces_even_with_a_live_handle() {
        let fatal: Rc<RefCell<Option<RendererError>>> = Rc::new(RefCell::new(None));
        let slot = fatal.clone();
        *slot.borrow_mut() = Some(RendererError::DeviceError {
            operation: "acquire frame",
            detail: "surface out of memory".into(),
        });

        // `slot` is still alive here, as the event-loop closure's copy is
        // when the loop returns.
        assert!(drain_fatal(&fatal).is_err());
        assert!(drain_fatal(&fatal).is_ok());
        drop(slot);
    }
}
