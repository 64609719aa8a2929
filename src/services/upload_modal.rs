use crate::entities::songs;
use crate::models::{Notice, SessionUser, UploadForm};
use crate::services::notify::{Notifier, ViewRefresher};
use crate::services::upload_workflow::{UploadError, UploadStage, UploadWorkflow};
use crate::utils::busy::LoadingFlag;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, warn};

pub const SONG_ADDED: &str = "Song has been added!";

/// Supplies the currently authenticated user, if any.
pub trait SessionSource: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

impl SessionSource for Option<SessionUser> {
    fn current_user(&self) -> Option<SessionUser> {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Added(songs::Model),
    Failed,
    /// A previous submission still holds the loading flag.
    Busy,
}

/// Controller behind the "Add a song" modal: owns the form values, the
/// loading flag and the open state, and turns every workflow result into a
/// notice.
pub struct UploadModal {
    workflow: Arc<UploadWorkflow>,
    session: Arc<dyn SessionSource>,
    notifier: Arc<dyn Notifier>,
    refresher: Arc<dyn ViewRefresher>,
    form: Mutex<UploadForm>,
    open: AtomicBool,
    loading: LoadingFlag,
    stage: watch::Sender<UploadStage>,
}

impl UploadModal {
    pub fn new(
        workflow: Arc<UploadWorkflow>,
        session: Arc<dyn SessionSource>,
        notifier: Arc<dyn Notifier>,
        refresher: Arc<dyn ViewRefresher>,
    ) -> Self {
        let (stage, _) = watch::channel(UploadStage::Idle);
        Self {
            workflow,
            session,
            notifier,
            refresher,
            form: Mutex::new(UploadForm::default()),
            open: AtomicBool::new(false),
            loading: LoadingFlag::new(),
            stage,
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Visibility change from the modal primitive. Closing resets the form;
    /// an in-flight submission keeps running.
    pub fn on_change(&self, open: bool) {
        if open {
            self.open();
        } else {
            self.reset();
            self.open.store(false, Ordering::Release);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadStage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> UploadStage {
        *self.stage.borrow()
    }

    pub fn form(&self) -> UploadForm {
        self.form
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn edit_form(&self, edit: impl FnOnce(&mut UploadForm)) {
        let mut form = self.form.lock().unwrap_or_else(PoisonError::into_inner);
        edit(&mut *form);
    }

    pub fn reset(&self) {
        *self.form.lock().unwrap_or_else(PoisonError::into_inner) = UploadForm::default();
    }

    /// Submits the values currently held in the form.
    pub async fn submit_form(&self) -> SubmitOutcome {
        let values = self.form();
        self.submit(values).await
    }

    /// Runs one submission attempt. Never fails: every result ends in a
    /// notice and the loading flag is released on all paths.
    pub async fn submit(&self, values: UploadForm) -> SubmitOutcome {
        let Some(_busy) = self.loading.try_acquire() else {
            debug!("Submit ignored while an upload is in progress");
            return SubmitOutcome::Busy;
        };

        let user = self.session.current_user();
        let attempt = AssertUnwindSafe(self.workflow.submit_with_progress(
            &values,
            user.as_ref(),
            &self.stage,
        ))
        .catch_unwind()
        .await;

        let result = attempt.unwrap_or_else(|panic| {
            self.stage.send_replace(UploadStage::Failed);
            Err(UploadError::Unexpected(panic_message(panic.as_ref())))
        });

        match result {
            Ok(song) => {
                if let Some(user) = &user {
                    self.refresher.refresh(user);
                }
                self.notifier.notify(Notice::success(SONG_ADDED));
                self.reset();
                self.open.store(false, Ordering::Release);
                self.stage.send_replace(UploadStage::Idle);
                SubmitOutcome::Added(song)
            }
            Err(e) => {
                match &e {
                    UploadError::Unexpected(detail) => error!("💥 Upload crashed: {}", detail),
                    other => warn!("Upload failed: {:?}", other),
                }
                self.notifier.notify(Notice::error(e.to_string()));
                SubmitOutcome::Failed
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
