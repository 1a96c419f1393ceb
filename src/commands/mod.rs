pub mod rewrite;
pub mod run;
