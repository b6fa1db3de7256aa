mod common;

mod form_submission_test;
mod traversal_test;
