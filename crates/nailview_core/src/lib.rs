//! Core rendering pipeline for nailview.
//! Turns statistical research records into a neutral and a reveal
//! composition, plus an interchange document and painting instructions.

pub mod config;
pub mod dataset;
pub mod export;
pub mod instructions;
pub mod layout;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod transform;
pub mod view;

pub use config::{CompositionConfig, CompositionRules, ConfigError, GeometryConstants, Range};
pub use dataset::{duplicate_names, Dataset, DatasetDocument, DatasetError, Metadata, RoleCounts};
pub use export::{build_interchange, ExportElement, InterchangeDocument};
pub use instructions::generate_instructions;
pub use layout::CanvasMapping;
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::record::{
    Category, DomainRecord, NailRole, RawRecord, RecordValidationError, RecordWarning,
};
pub use model::visual::{DomainVisual, Rgb};
pub use normalize::normalize;
pub use pipeline::{
    append_and_regenerate, archive_outputs, generate_all, AppendReport, GenerateOptions,
    GenerationReport, PipelineError,
};
pub use render::render_svg;
pub use transform::{transform_point, transform_visual};
pub use view::{compose_pair, compose_view, ComposedView, ViewPair};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
