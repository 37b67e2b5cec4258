// User input held by the wizard: the résumé document and the job description.

pub mod document;
pub mod job_description;
