pub mod artifact;
pub mod filter;
pub mod loaders;
pub mod question;
pub mod result;
pub mod upload;

pub use artifact::RunArtifacts;
pub use filter::{FormFilter, QuestionType};
pub use loaders::{load_all_toml_files, load_toml_to_form_request, FormRequest};
pub use question::{
    order_by_identifiers, parse_question_details, AnswerOption, MediaRef, QuestionDetail,
    SearchOutcome,
};
pub use result::{FlowState, FormDocument, FormResult};
pub use upload::{UploadResult, UploadStatus};
