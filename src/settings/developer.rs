//! Developer toggles.
use serde_json::Value;

use super::section::{Fragment, Section, read_field};

/// The `developer` section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Developer {
    /// Drop script bindings whose native target no longer exists.
    pub remove_dead_bindings: bool,
    /// Turn overlay assertion failures into hard errors.
    pub enable_imgui_assertions: bool,
    /// Dump the game's option tree on startup.
    pub dump_game_options: bool,
    /// Lines kept in the console history.
    pub max_lines_console_history: u64,
    /// Persist console history across runs.
    pub persistent_console: bool,
    /// Let the script runtime use its JIT.
    pub enable_jit: bool,
}

impl Default for Developer {
    fn default() -> Self {
        Self {
            remove_dead_bindings: true,
            enable_imgui_assertions: false,
            dump_game_options: false,
            max_lines_console_history: 1000,
            persistent_console: true,
            enable_jit: true,
        }
    }
}

impl Section for Developer {
    const KEY: &'static str = "developer";

    fn load(&mut self, fragment: &Fragment) {
        read_field(fragment, Self::KEY, "remove_dead_bindings", &mut self.remove_dead_bindings);
        read_field(
            fragment,
            Self::KEY,
            "enable_imgui_assertions",
            &mut self.enable_imgui_assertions,
        );
        read_field(fragment, Self::KEY, "dump_game_options", &mut self.dump_game_options);
        read_field(
            fragment,
            Self::KEY,
            "max_lines_console_history",
            &mut self.max_lines_console_history,
        );
        read_field(fragment, Self::KEY, "persistent_console", &mut self.persistent_console);
        read_field(fragment, Self::KEY, "enable_jit", &mut self.enable_jit);
    }

    fn save(&self) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.insert("remove_dead_bindings".into(), Value::from(self.remove_dead_bindings));
        fragment.insert(
            "enable_imgui_assertions".into(),
            Value::from(self.enable_imgui_assertions),
        );
        fragment.insert("dump_game_options".into(), Value::from(self.dump_game_options));
        fragment.insert(
            "max_lines_console_history".into(),
            Value::from(self.max_lines_console_history),
        );
        fragment.insert("persistent_console".into(), Value::from(self.persistent_console));
        fragment.insert("enable_jit".into(), Value::from(self.enable_jit));
        fragment
    }
}
