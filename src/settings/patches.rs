//! Optional game patches toggled by the user.
use serde_json::Value;

use super::section::{Fragment, Section, read_field};

/// The `patches` section. Every patch is off by default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Patches {
    /// Turn off async compute.
    pub disable_async_compute: bool,
    /// Turn off anti-aliasing.
    pub disable_antialiasing: bool,
    /// Remove the screen vignette.
    pub disable_vignette: bool,
    /// Remove the map boundary teleport.
    pub disable_boundary_teleport: bool,
    /// Skip the Windows 7 vsync workaround.
    pub disable_win7_vsync: bool,
}

impl Section for Patches {
    const KEY: &'static str = "patches";

    fn load(&mut self, fragment: &Fragment) {
        read_field(fragment, Self::KEY, "disable_async_compute", &mut self.disable_async_compute);
        read_field(fragment, Self::KEY, "disable_antialiasing", &mut self.disable_antialiasing);
        read_field(fragment, Self::KEY, "disable_vignette", &mut self.disable_vignette);
        read_field(
            fragment,
            Self::KEY,
            "disable_boundary_teleport",
            &mut self.disable_boundary_teleport,
        );
        read_field(fragment, Self::KEY, "disable_win7_vsync", &mut self.disable_win7_vsync);
    }

    fn save(&self) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.insert("disable_async_compute".into(), Value::from(self.disable_async_compute));
        fragment.insert("disable_antialiasing".into(), Value::from(self.disable_antialiasing));
        fragment.insert("disable_vignette".into(), Value::from(self.disable_vignette));
        fragment.insert(
            "disable_boundary_teleport".into(),
            Value::from(self.disable_boundary_teleport),
        );
        fragment.insert("disable_win7_vsync".into(), Value::from(self.disable_win7_vsync));
        fragment
    }
}
