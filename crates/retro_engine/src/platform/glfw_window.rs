//! GLFW window without a client API; the renderer owns the surface

use log::info;

use super::{Platform, PlatformError};
use crate::application::AppEvent;
use crate::core::WindowConfig;
use crate::input::{KeyCode, MouseButton};

/// Desktop window backed by GLFW
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlfwPlatform {
    /// Open a window
    pub fn new(config: &WindowConfig) -> Result<Self, PlatformError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| PlatformError::InitializationFailed(e.to_string()))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(PlatformError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        info!("Opened {}x{} window '{}'", config.width, config.height, config.title);
        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// The GLFW window, for surface creation
    #[must_use]
    pub const fn window(&self) -> &glfw::PWindow {
        &self.window
    }
}

impl Platform for GlfwPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        self.glfw.poll_events();
        let mut events = Vec::new();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let Some(event) = translate(&event) {
                events.push(event);
            }
        }
        if self.window.should_close() && !events.contains(&AppEvent::CloseRequested) {
            events.push(AppEvent::CloseRequested);
        }
        events
    }

    #[allow(clippy::cast_sign_loss)]
    fn window_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }
}

#[allow(clippy::cast_sign_loss)]
fn translate(event: &glfw::WindowEvent) -> Option<AppEvent> {
    match *event {
        glfw::WindowEvent::Key(key, _, action, _) => {
            let key = key_code(key)?;
            match action {
                glfw::Action::Press => Some(AppEvent::KeyPressed(key)),
                glfw::Action::Release => Some(AppEvent::KeyReleased(key)),
                glfw::Action::Repeat => None,
            }
        }
        glfw::WindowEvent::MouseButton(button, action, _) => {
            let button = match button {
                glfw::MouseButton::Button1 => MouseButton::Left,
                glfw::MouseButton::Button2 => MouseButton::Right,
                glfw::MouseButton::Button3 => MouseButton::Middle,
                _ => return None,
            };
            Some(AppEvent::MouseButton {
                button,
                pressed: action != glfw::Action::Release,
            })
        }
        glfw::WindowEvent::CursorPos(x, y) => Some(AppEvent::MouseMoved { x, y }),
        glfw::WindowEvent::FramebufferSize(width, height) => Some(AppEvent::WindowResized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::Close => Some(AppEvent::CloseRequested),
        _ => None,
    }
}

const fn key_code(key: glfw::Key) -> Option<KeyCode> {
    Some(match key {
        glfw::Key::A => KeyCode::A,
        glfw::Key::D => KeyCode::D,
        glfw::Key::E => KeyCode::E,
        glfw::Key::F => KeyCode::F,
        glfw::Key::Q => KeyCode::Q,
        glfw::Key::R => KeyCode::R,
        glfw::Key::S => KeyCode::S,
        glfw::Key::W => KeyCode::W,
        glfw::Key::Space => KeyCode::Space,
        glfw::Key::Enter => KeyCode::Enter,
        glfw::Key::Escape => KeyCode::Escape,
        glfw::Key::LeftShift => KeyCode::LeftShift,
        glfw::Key::Up => KeyCode::Up,
        glfw::Key::Down => KeyCode::Down,
        glfw::Key::Left => KeyCode::Left,
        glfw::Key::Right => KeyCode::Right,
        _ => return None,
    })
}
