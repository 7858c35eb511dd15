//! Local source packaging and generated project extraction.
//!
//! Local accelerator and fragment directories are walked with `.git` pruning and
//! layered `.gitignore` rules, serialized as tar.gz and combined into a multipart
//! generation request. The zip the server returns is unpacked under an overwrite
//! policy.

pub mod archive;
pub mod extract;
pub mod ignore;
pub mod request;

pub use archive::{collect_files, write_tar, write_tar_gz, SourceFile};
pub use extract::{extract_project, OverwritePolicy};
pub use request::{AcceleratorSource, FormPart, GenerationRequest, SourceBundle};
