//! The interactive booth session.
//!
//! One loop owns every concurrent activity on the page: the session
//! countdown, the recording session when one is live, and the candidate's
//! commands. Network calls suspend the loop without blocking the runtime,
//! and teardown releases the capture stream and cancels both tick tasks no
//! matter which path exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, watch};

use booth::{
    format_elapsed, format_remaining, recorder, Countdown, CountdownEvent, InterviewApi,
    PlaybackHandle, QuestionDeck, RecorderStatus, RecordingHandle, RetryLedger, Session,
    SubmissionPipeline, SubmitError, Take, MAX_TAKE_SECS, TAKE_FILENAME,
};
use optic::{CaptureBackend, CaptureStream, VideoConstraints};
use stagedoor::TokenStore;

/// Commands accepted at the booth prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothCommand {
    Camera,
    Record,
    Stop,
    Retry,
    Upload,
    Next,
    Previous,
    Status,
    Help,
    Quit,
}

impl BoothCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "camera" => Some(Self::Camera),
            "record" => Some(Self::Record),
            "stop" => Some(Self::Stop),
            "retry" => Some(Self::Retry),
            "upload" => Some(Self::Upload),
            "next" => Some(Self::Next),
            "prev" | "previous" => Some(Self::Previous),
            "status" => Some(Self::Status),
            "help" | "?" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// The booth state machine, wired to a capture backend and the API seam.
pub struct Booth {
    api: Arc<dyn InterviewApi>,
    backend: Arc<dyn CaptureBackend>,
    tokens: TokenStore,
    state_dir: PathBuf,
    token: String,
    session: Session,
    countdown: Countdown,
    deck: QuestionDeck,
    ledger: RetryLedger,
    pipeline: SubmissionPipeline,
    stream: Option<CaptureStream>,
    recording: Option<RecordingHandle>,
    take: Option<Take>,
    playback: Option<PlaybackHandle>,
    submitted: bool,
}

impl Booth {
    /// Check the candidate in: verify the stored token, pull the session,
    /// open the retry ledger, and start the countdown.
    ///
    /// Returns the booth plus the countdown notice channel the caller
    /// drives through [`Booth::handle_countdown_event`].
    pub async fn checked_in(
        api: Arc<dyn InterviewApi>,
        backend: Arc<dyn CaptureBackend>,
        tokens: TokenStore,
        state_dir: PathBuf,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CountdownEvent>)> {
        let Some(token) = tokens.load() else {
            bail!("not signed in, run `greenroom login` first");
        };

        let session = match api.refresh_session(&token).await {
            Ok(session) => session,
            Err(failure) => {
                tokens.clear();
                bail!("session check failed: {failure}");
            }
        };

        let ledger = RetryLedger::open(&state_dir).context("failed to open the retry ledger")?;

        let (event_tx, events) = mpsc::unbounded_channel();
        let countdown = Countdown::start(session.access_expiry.as_deref(), event_tx);
        let submitted = session.upload_completed();

        let booth = Self {
            pipeline: SubmissionPipeline::new(api.clone()),
            api,
            backend,
            tokens,
            state_dir,
            token,
            session,
            countdown,
            deck: QuestionDeck::new(),
            ledger,
            stream: None,
            recording: None,
            take: None,
            playback: None,
            submitted,
        };
        Ok((booth, events))
    }

    pub fn recorder_status(&self) -> RecorderStatus {
        if self.recording.is_some() {
            RecorderStatus::Recording
        } else if self.take.is_some() {
            RecorderStatus::Stopped
        } else {
            RecorderStatus::Idle
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn has_take(&self) -> bool {
        self.take.is_some()
    }

    pub fn take_oversized(&self) -> bool {
        matches!(&self.take, Some(t) if t.oversized)
    }

    pub fn retries_remaining(&self) -> u32 {
        self.ledger.remaining()
    }

    pub fn question_position(&self) -> (usize, usize) {
        self.deck.position()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.countdown.remaining_ms()
    }

    /// Drive the booth until the candidate quits or the session forces a
    /// logout.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<CountdownEvent>,
    ) -> Result<()> {
        self.print_welcome();
        let mut lines = spawn_line_reader();

        loop {
            let mut cap_rx = self.recording.as_ref().map(RecordingHandle::elapsed_watch);
            let cap_fired = async move {
                match cap_rx.as_mut() {
                    Some(rx) => cap_reached(rx).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                Some(event) = events.recv() => {
                    if !self.handle_countdown_event(event).await? {
                        break;
                    }
                }
                _ = cap_fired => {
                    self.finish_recording().await?;
                }
                line = lines.recv() => {
                    let Some(line) = line else { break };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match BoothCommand::parse(trimmed) {
                        Some(command) => {
                            if !self.handle_command(command).await? {
                                break;
                            }
                        }
                        None => println!("Unknown command {trimmed:?}, try `help`."),
                    }
                }
            }
        }

        self.teardown();
        Ok(())
    }

    /// React to a countdown notice. Returns `false` once the booth must
    /// close.
    pub async fn handle_countdown_event(&mut self, event: CountdownEvent) -> Result<bool> {
        match event {
            CountdownEvent::FiveMinuteWarning => {
                println!(
                    "Session Ending Soon: your session will expire in 5 minutes. \
                     Please complete your interview."
                );
                Ok(true)
            }
            CountdownEvent::Expired => {
                println!("Session Expired: your session has expired. You will be logged out.");
                Ok(true)
            }
            CountdownEvent::ForcedLogout => {
                self.sign_out().await;
                Ok(false)
            }
        }
    }

    /// Execute one booth command. Returns `false` when the booth should
    /// close.
    pub async fn handle_command(&mut self, command: BoothCommand) -> Result<bool> {
        match command {
            BoothCommand::Camera => self.start_camera().await,
            BoothCommand::Record => self.start_recording(),
            BoothCommand::Stop => self.finish_recording().await?,
            BoothCommand::Retry => self.retry()?,
            BoothCommand::Upload => self.upload().await?,
            BoothCommand::Next => {
                self.deck.next();
                self.print_question();
            }
            BoothCommand::Previous => {
                self.deck.previous();
                self.print_question();
            }
            BoothCommand::Status => self.print_status(),
            BoothCommand::Help => print_help(),
            BoothCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn start_camera(&mut self) {
        if self.recording.is_some() {
            println!("Recording in progress, stop it first.");
            return;
        }

        // Replacing a stream releases the old one before the new acquire.
        if let Some(mut old) = self.stream.take() {
            old.release();
        }

        match self.backend.acquire(&VideoConstraints::default()).await {
            Ok(stream) => {
                println!("Camera on ({}). Live preview is muted.", stream.mime_type());
                self.stream = Some(stream);
            }
            Err(err) => {
                tracing::warn!(%err, "camera acquisition failed");
                println!(
                    "Camera access failed: please ensure you have granted camera and \
                     microphone permissions."
                );
            }
        }
    }

    fn start_recording(&mut self) {
        if self.submitted {
            println!("Your interview is already submitted.");
            return;
        }
        if self.recording.is_some() {
            println!("Already recording.");
            return;
        }
        if self.take.is_some() {
            println!("A recording is waiting to upload. Use `upload`, or `retry` to discard it.");
            return;
        }
        let Some(stream) = self.stream.take() else {
            println!("No camera yet, run `camera` first.");
            return;
        };

        self.playback = None;
        self.recording = Some(recorder::start(stream));
        println!(
            "Recording. One continuous take answers all questions; it stops \
             automatically at {}.",
            format_elapsed(MAX_TAKE_SECS)
        );
    }

    async fn finish_recording(&mut self) -> Result<()> {
        let Some(handle) = self.recording.take() else {
            println!("Not recording.");
            return Ok(());
        };

        match handle.stop().await {
            Ok((take, stream)) => {
                self.stream = Some(stream);
                if take.oversized {
                    println!(
                        "Video size too large: please try recording a shorter video. \
                         Upload is disabled for this take."
                    );
                } else {
                    println!(
                        "Recording captured: {} ({} MB). Playback preview is ready; \
                         `upload` to submit or `retry` to record again.",
                        TAKE_FILENAME,
                        take.size_mb()
                    );
                }
                match PlaybackHandle::materialize(&take, &self.state_dir) {
                    Ok(handle) => {
                        println!("Review your take at {}", handle.path().display());
                        self.playback = Some(handle);
                    }
                    Err(err) => tracing::warn!(%err, "could not materialize playback copy"),
                }
                self.take = Some(take);
            }
            Err(err) => {
                println!("Recording ended unexpectedly: {err}");
            }
        }
        Ok(())
    }

    fn retry(&mut self) -> Result<()> {
        if self.pipeline.is_uploading() {
            println!("Upload in progress, hold on.");
            return Ok(());
        }
        if self.recording.is_some() {
            println!("Stop the recording before retrying.");
            return Ok(());
        }
        if self.take.is_none() {
            println!("Nothing to discard yet.");
            return Ok(());
        }

        if self.ledger.consume().context("failed to persist the retry ledger")? {
            self.take = None;
            self.playback = None;
            println!(
                "Take discarded. {} retr{} remaining. The camera is still on, `record` \
                 when ready.",
                self.ledger.remaining(),
                if self.ledger.remaining() == 1 { "y" } else { "ies" }
            );
        } else {
            println!("No retries remaining.");
        }
        Ok(())
    }

    async fn upload(&mut self) -> Result<()> {
        let Some(take) = self.take.as_ref() else {
            println!("No video recorded yet. Start your camera and record your response.");
            return Ok(());
        };

        println!("Uploading...");
        match self.pipeline.submit(Some(&self.token), take).await {
            Ok(outcome) => {
                if let Some(session) = outcome.session() {
                    self.session = session.clone();
                }
                self.take = None;
                self.playback = None;
                self.submitted = true;
                if outcome.confirmed() {
                    println!("Upload successful: your video has been uploaded successfully.");
                } else {
                    println!(
                        "Upload successful. The server is still processing the \
                         confirmation; it will show as completed shortly."
                    );
                }
                self.print_submitted_banner();
            }
            Err(SubmitError::MissingToken) => {
                println!("Authentication error: please log in again.");
            }
            Err(SubmitError::Oversized) => {
                println!(
                    "Video file is too large. Please record a shorter video or try again \
                     with lower quality settings."
                );
            }
            Err(SubmitError::Busy) => {
                println!("An upload is already in progress.");
            }
            Err(SubmitError::Upload(message)) => {
                // The take is retained; uploading again is always safe.
                println!("Upload failed: {message}");
            }
        }
        Ok(())
    }

    async fn sign_out(&mut self) {
        if let Err(failure) = self.api.end_session(&self.token).await {
            tracing::warn!(%failure, "server-side logout failed");
        }
        self.tokens.clear();
        println!("Signed out.");
    }

    fn teardown(&mut self) {
        self.countdown.shutdown();
        self.recording = None;
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
        self.playback = None;
    }

    fn print_welcome(&self) {
        if self.submitted {
            self.print_submitted_banner();
            return;
        }
        println!("Video Interview");
        println!(
            "Time remaining: {}",
            format_remaining(self.countdown.remaining_ms() as i64)
        );
        println!(
            "You have {} retries remaining. Type `help` for commands.",
            self.ledger.remaining()
        );
        self.print_question();
    }

    fn print_submitted_banner(&self) {
        println!("Interview Submission Complete");
        println!(
            "Thank you for submitting your video interview. Your submission has been \
             received and is being processed. You may now close this window or log out."
        );
    }

    fn print_question(&self) {
        let (pos, total) = self.deck.position();
        let question = self.deck.current();
        println!("Question {pos} of {total}: {}", question.title);
        println!("{}", question.prompt);
        if let Some(tip) = question.tip {
            println!("Tip: {tip}");
        }
    }

    fn print_status(&self) {
        println!(
            "Time remaining: {}",
            format_remaining(self.countdown.remaining_ms() as i64)
        );
        let status = self.recorder_status();
        match (&self.recording, &self.take) {
            (Some(handle), _) => println!(
                "Recorder: {status}, {} elapsed",
                format_elapsed(handle.elapsed_secs())
            ),
            (None, Some(take)) => println!(
                "Recorder: {status}, {} ({} MB{})",
                TAKE_FILENAME,
                take.size_mb(),
                if take.oversized { ", too large to upload" } else { "" }
            ),
            (None, None) => println!("Recorder: {status}"),
        }
        println!("Retries remaining: {}", self.ledger.remaining());
        let (pos, total) = self.deck.position();
        println!("Question {pos} of {total}");
        if self.submitted {
            println!("Submission: completed");
        }
    }
}

/// Resolve once the elapsed watch crosses the hard cap or the recording
/// task finishes on its own.
async fn cap_reached(rx: &mut watch::Receiver<u64>) {
    loop {
        if *rx.borrow() >= MAX_TAKE_SECS {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn print_help() {
    println!("camera   turn the camera on (or replace the current stream)");
    println!("record   start the single continuous recording");
    println!("stop     stop recording and keep the take");
    println!("retry    discard the take and spend one retry");
    println!("upload   submit the take");
    println!("next     show the next question");
    println!("prev     show the previous question");
    println!("status   show timers, take, and retries");
    println!("quit     leave the booth (the session stays signed in)");
}

/// Feed prompt lines from a dedicated thread so the async loop can select
/// across them, the countdown, and the recorder.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut editor = match rustyline::DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                tracing::error!(%err, "could not open the prompt");
                return;
            }
        };
        loop {
            match editor.readline("greenroom> ") {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted)
                | Err(rustyline::error::ReadlineError::Eof) => {
                    let _ = tx.send("quit".to_string());
                    break;
                }
                Err(err) => {
                    tracing::error!(%err, "prompt failed");
                    break;
                }
            }
        }
    });
    rx
}
