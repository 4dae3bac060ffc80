//! Crux capabilities used by the core.
//!
//! Both are Crux built-ins: `Http` fetches the place hierarchy and the group
//! listing, `Render` asks the shell to pull a fresh view model.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
