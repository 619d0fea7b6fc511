use crate::fields::Channel;
use crate::viz::ChartKind;
use thiserror::Error;

/// Configuration problems detected when a chart is constructed.
///
/// Data problems (empty input, missing cells) are not errors; they degrade to
/// empty or placeholder states instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldsError {
    #[error("`{kind}` charts require the `{channel}` channel")]
    MissingChannel { kind: ChartKind, channel: Channel },

    #[error("invalid color `{color}` for `{value}` (expected #rgb or #rrggbb)")]
    InvalidColor { value: String, color: String },

    #[error("unknown palette `{0}`")]
    UnknownPalette(String),

    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f64),

    #[error("container width must be finite and non-negative, got {0}")]
    InvalidContainerWidth(f64),

    #[error("a pivot needs at least one wide column")]
    EmptyPivot,
}
