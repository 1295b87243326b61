//! Request structured input from a user by suspending on a form and resuming
//! once a submission passes validation.

pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod protocol;
pub mod render;
pub mod services;
pub mod theme;

pub use error::{ConversionError, InputError, SpecificationError, StaleReason, StaleSubmissionError};
pub use input::{
    actions, checkbox, file_upload, input, input_group, number, password, radio, select, text,
    textarea, FieldInput, InputGroup, SingleInput,
};
pub use model::{FieldError, FieldKind, FieldSpec, FieldValue, FormData, FormSpec, UploadedFile};
pub use protocol::session::{Session, Transport};
pub use protocol::{Emission, PendingRequest, RequestId, Step, Submission};
