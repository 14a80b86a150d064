//! Command workflows shared by the binary's subcommands and interactive menu

pub mod orchestration;

pub use orchestration::{
    run_archive_workflow, run_cleanup_workflow, run_create_workflow, run_delete_workflow,
    run_list_workflow, target_projects, BatchOutcome, CleanupWorkflowArgs, CreateWorkflowArgs,
    DeleteWorkflowArgs, ListWorkflowArgs,
};
