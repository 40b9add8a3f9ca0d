use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

/// Immutable per-frame shading inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub color: glam::Vec4,
    /// Direction the light travels in. Used as given by the shader, so a
    /// non-unit vector scales the lighting.
    pub light_direction: glam::Vec3,
}

impl RenderSettings {
    pub const DEFAULT_COLOR: glam::Vec4 = glam::Vec4::ONE;

    pub fn new(color: glam::Vec4, light_direction: glam::Vec3) -> Self {
        Self {
            color,
            light_direction,
        }
    }

    pub fn with_color(color: glam::Vec4) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Light coming from the top right, travelling along (-1, -1, -1).
    pub fn default_light_direction() -> glam::Vec3 {
        glam::Vec3::NEG_ONE.normalize()
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color: Self::DEFAULT_COLOR,
            light_direction: Self::default_light_direction(),
        }
    }
}

/// Values editable from the viewport, clamped to the same ranges as the
/// sliders they stand in for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderValues {
    /// Each channel in [0, 1].
    pub color: glam::Vec4,
    /// Each component in [-1, 1], not normalized.
    pub light: glam::Vec3,
}

impl Default for SliderValues {
    fn default() -> Self {
        Self {
            color: glam::Vec4::ONE,
            light: glam::Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

impl SliderValues {
    pub fn clamped(self) -> Self {
        Self {
            color: self.color.clamp(glam::Vec4::ZERO, glam::Vec4::ONE),
            light: self.light.clamp(glam::Vec3::NEG_ONE, glam::Vec3::ONE),
        }
    }
}

pub struct SettingsController {
    values: SliderValues,
    pub color_step: f32,
    pub light_step: f32,
}

impl SettingsController {
    pub fn new(values: SliderValues, color_step: f32, light_step: f32) -> Self {
        Self {
            values: values.clamped(),
            color_step,
            light_step,
        }
    }

    pub fn values(&self) -> SliderValues {
        self.values
    }

    pub fn reset(&mut self) {
        self.values = SliderValues::default();
        tracing::info!("settings reset");
    }

    /// Snapshot used for one frame. The light vector is normalized here; a
    /// zero vector falls back to the default light direction.
    pub fn snapshot(&self) -> RenderSettings {
        let light_direction = self
            .values
            .light
            .try_normalize()
            .unwrap_or_else(RenderSettings::default_light_direction);
        RenderSettings::new(self.values.color, light_direction)
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => self.process_key(*keycode),
            _ => false,
        }
    }

    pub fn process_key(&mut self, keycode: VirtualKeyCode) -> bool {
        let (c, l) = (self.color_step, self.light_step);
        let (color_delta, light_delta) = match keycode {
            VirtualKeyCode::R => (glam::Vec4::X * c, glam::Vec3::ZERO),
            VirtualKeyCode::F => (glam::Vec4::X * -c, glam::Vec3::ZERO),
            VirtualKeyCode::G => (glam::Vec4::Y * c, glam::Vec3::ZERO),
            VirtualKeyCode::H => (glam::Vec4::Y * -c, glam::Vec3::ZERO),
            VirtualKeyCode::B => (glam::Vec4::Z * c, glam::Vec3::ZERO),
            VirtualKeyCode::N => (glam::Vec4::Z * -c, glam::Vec3::ZERO),
            VirtualKeyCode::T => (glam::Vec4::W * c, glam::Vec3::ZERO),
            VirtualKeyCode::Y => (glam::Vec4::W * -c, glam::Vec3::ZERO),
            VirtualKeyCode::Right => (glam::Vec4::ZERO, glam::Vec3::X * l),
            VirtualKeyCode::Left => (glam::Vec4::ZERO, glam::Vec3::X * -l),
            VirtualKeyCode::Up => (glam::Vec4::ZERO, glam::Vec3::Y * l),
            VirtualKeyCode::Down => (glam::Vec4::ZERO, glam::Vec3::Y * -l),
            VirtualKeyCode::PageUp => (glam::Vec4::ZERO, glam::Vec3::Z * l),
            VirtualKeyCode::PageDown => (glam::Vec4::ZERO, glam::Vec3::Z * -l),
            VirtualKeyCode::Back => {
                self.reset();
                return true;
            }
            _ => return false,
        };

        self.values = SliderValues {
            color: self.values.color + color_delta,
            light: self.values.light + light_delta,
        }
        .clamped();
        tracing::debug!(color = ?self.values.color, light = ?self.values.light, "settings changed");
        true
    }
}
