#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config, parse_config};
pub use ir::{DataEntity, EventModel, Frame, ModelEntityType};
pub use layout::{LayoutContext, LayoutError, compute_layout};
pub use render::render_svg;
pub use text_metrics::{FixedMetrics, SystemFontMetrics, TextMeasurer};
pub use theme::Theme;

/// Lay out `model` and render it in one step.
pub fn render_model_svg(
    model: &EventModel,
    config: &Config,
    measurer: &dyn TextMeasurer,
) -> Result<String, LayoutError> {
    let layout = compute_layout(model, &config.theme, &config.layout, measurer)?;
    Ok(render_svg(&layout, &config.theme, &config.layout, &config.render))
}
