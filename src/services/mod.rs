pub mod keys;
pub mod notify;
pub mod song_cache;
pub mod song_table;
pub mod storage;
pub mod upload_modal;
pub mod upload_workflow;
