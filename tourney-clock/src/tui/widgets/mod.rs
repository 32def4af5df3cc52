// TUI widget modules for each dashboard panel.

pub mod clock_face;
pub mod field;
pub mod help;
pub mod level_banner;
pub mod status_bar;
pub mod up_next;
