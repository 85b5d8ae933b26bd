use docqa_core::{
    default_upload_metadata, ApiClient, ApiError, QueryRequest, SelectedFile, Transcript,
    UploadForm, UploadResult,
};
use ratatui::layout::Rect;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// What the Upload screen passes to the Chat screen.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub document_name: String,
    pub upload: UploadResult,
}

pub struct UploadScreen {
    pub form: UploadForm,
    pub path_input: String,
    pub path_cursor: usize, // cursor position in path_input
    pub input_mode: InputMode,
    // Drop zone area for mouse hit-testing (updated during render)
    pub drop_area: Option<Rect>,
}

impl UploadScreen {
    pub fn new() -> Self {
        Self {
            form: UploadForm::new(),
            path_input: String::new(),
            path_cursor: 0,
            input_mode: InputMode::Editing,
            drop_area: None,
        }
    }
}

pub struct ChatScreen {
    pub document_name: String,
    pub document: UploadResult,
    pub transcript: Transcript,
    pub input: String,
    pub cursor: usize,
    pub input_mode: InputMode,
    pub scroll: u16,
    pub chat_height: u16,   // Inner height of the chat area, set during render
    pub content_lines: u16, // Wrapped transcript height from the last render
    pub follow_bottom: bool,
    pub query_task: Option<JoinHandle<Result<String, ApiError>>>,
}

impl ChatScreen {
    pub fn new(handoff: Handoff) -> Self {
        let transcript = Transcript::new(Some(&handoff.document_name));
        Self {
            document_name: handoff.document_name,
            document: handoff.upload,
            transcript,
            input: String::new(),
            cursor: 0,
            input_mode: InputMode::Editing,
            scroll: 0,
            chat_height: 0,
            content_lines: 0,
            follow_bottom: true,
            query_task: None,
        }
    }

    /// Send the typed question. Blank input or a pending answer makes this a no-op.
    pub fn submit(&mut self, api: &ApiClient) -> bool {
        let Some(question) = self.transcript.submit(&self.input) else {
            return false;
        };

        self.input.clear();
        self.cursor = 0;
        self.scroll_to_bottom();

        let api = api.clone();
        self.query_task = Some(tokio::spawn(async move {
            api.query_document(&QueryRequest::new(question)).await
        }));
        true
    }

    pub fn clear(&mut self) -> bool {
        let cleared = self.transcript.clear();
        if cleared {
            self.scroll_to_bottom();
        }
        cleared
    }

    async fn collect(&mut self, wait: bool) {
        let ready = self
            .query_task
            .as_ref()
            .is_some_and(|task| wait || task.is_finished());
        if !ready {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let result = flatten(task.await);
            if let Err(err) = &result {
                warn!("query failed: {}", err);
            }
            self.transcript.resolve(result);
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_by_down(1);
    }

    pub fn scroll_up(&mut self) {
        self.follow_bottom = false;
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_by_down(self.visible_height() / 2);
    }

    pub fn scroll_page_up(&mut self) {
        self.follow_bottom = false;
        self.scroll = self.scroll.saturating_sub(self.visible_height() / 2);
    }

    pub fn scroll_to_top(&mut self) {
        self.follow_bottom = false;
        self.scroll = 0;
    }

    /// Keep the latest message (or the typing indicator) in view. The exact
    /// offset is resolved against the wrapped line count at render time.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.scroll = self.max_scroll();
    }

    /// Record the wrapped height of the transcript and clamp the scroll to it.
    pub fn set_viewport(&mut self, content_lines: u16, height: u16) {
        self.content_lines = content_lines;
        self.chat_height = height;
        if self.follow_bottom {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn scroll_by_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
        self.follow_bottom = self.scroll == max_scroll;
    }

    fn max_scroll(&self) -> u16 {
        self.content_lines.saturating_sub(self.visible_height())
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }
}

/// The one active screen. Chat state only exists inside `Screen::Chat`.
pub enum Screen {
    Upload(UploadScreen),
    Chat(ChatScreen),
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub api: ApiClient,

    // Upload in flight, and the file it carries to the Chat screen
    pub upload_task: Option<JoinHandle<Result<UploadResult, ApiError>>>,
    pub uploading_file: Option<SelectedFile>,

    // Animation state
    pub animation_frame: u8, // 0-2 for spinner/ellipsis animation
}

impl App {
    pub fn new(api: ApiClient) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Upload(UploadScreen::new()),
            api,
            upload_task: None,
            uploading_file: None,
            animation_frame: 0,
        }
    }

    /// Validate the typed path and start the upload when it is accepted.
    pub fn submit_path(&mut self) {
        let Screen::Upload(upload) = &mut self.screen else {
            return;
        };
        if upload.path_input.trim().is_empty() {
            return;
        }

        let path = docqa_core::normalize_dropped_path(&upload.path_input);
        if let Ok(file) = upload.form.select_path(path) {
            upload.path_input.clear();
            upload.path_cursor = 0;
            self.start_upload(file);
        }
    }

    /// A path dropped (pasted) onto the Upload screen.
    pub fn drop_path(&mut self, text: &str) {
        let Screen::Upload(upload) = &mut self.screen else {
            return;
        };
        if let Ok(file) = upload.form.drop_text(text) {
            self.start_upload(file);
        }
    }

    /// Upload the retained selection again after a failure.
    pub fn retry_upload(&mut self) {
        let Screen::Upload(upload) = &self.screen else {
            return;
        };
        if upload.form.is_uploading() {
            return;
        }
        if let Some(file) = upload.form.selected().cloned() {
            self.start_upload(file);
        }
    }

    fn start_upload(&mut self, file: SelectedFile) {
        let Screen::Upload(upload) = &mut self.screen else {
            return;
        };
        upload.form.begin_upload();

        info!(file = %file.name, "starting upload");
        let api = self.api.clone();
        let task_file = file.clone();
        self.upload_task = Some(tokio::spawn(async move {
            api.upload_document(&task_file, Some(&default_upload_metadata()))
                .await
        }));
        self.uploading_file = Some(file);
    }

    fn finish_upload(&mut self, result: Result<UploadResult, String>) {
        let file = self.uploading_file.take();
        let Screen::Upload(upload) = &mut self.screen else {
            return;
        };

        match (result, file) {
            (Ok(upload_result), Some(file)) => {
                upload.form.complete_upload();
                info!(id = %upload_result.id, "switching to chat");
                self.screen = Screen::Chat(ChatScreen::new(Handoff {
                    document_name: file.name,
                    upload: upload_result,
                }));
            }
            (Ok(_), None) => {
                upload.form.fail_upload("Upload failed: no file was being uploaded");
            }
            (Err(message), _) => {
                warn!("upload failed: {}", message);
                upload.form.fail_upload(message);
            }
        }
    }

    /// Leave the chat. The document and transcript are dropped; an in-flight
    /// query keeps running detached and its answer is discarded.
    pub fn back_to_upload(&mut self) {
        if let Screen::Chat(chat) = &self.screen {
            info!(document = %chat.document.id, "returning to upload");
        }
        self.screen = Screen::Upload(UploadScreen::new());
        self.upload_task = None;
        self.uploading_file = None;
    }

    /// Pick up finished network requests without blocking.
    pub async fn poll_tasks(&mut self) {
        self.collect(false).await;
    }

    async fn collect(&mut self, wait: bool) {
        let upload_ready = self
            .upload_task
            .as_ref()
            .is_some_and(|task| wait || task.is_finished());
        if upload_ready {
            if let Some(task) = self.upload_task.take() {
                let result = flatten(task.await);
                self.finish_upload(result);
            }
        }

        if let Screen::Chat(chat) = &mut self.screen {
            chat.collect(wait).await;
        }
    }

    pub fn is_busy(&self) -> bool {
        match &self.screen {
            Screen::Upload(upload) => upload.form.is_uploading(),
            Screen::Chat(chat) => chat.transcript.is_awaiting(),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn screen_title(&self) -> &'static str {
        match self.screen {
            Screen::Upload(_) => "Upload PDF Document",
            Screen::Chat(_) => "Ask AI",
        }
    }
}

/// Collapse a task join result into a displayable error.
fn flatten<T>(joined: Result<Result<T, ApiError>, JoinError>) -> Result<T, String> {
    match joined {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(err) => Err(format!("request task failed: {}", err)),
    }
}

#[cfg(test)]
impl App {
    /// Wait for every in-flight request and apply its result.
    pub async fn settle(&mut self) {
        self.collect(true).await;
    }

    pub fn upload_screen(&self) -> &UploadScreen {
        match &self.screen {
            Screen::Upload(upload) => upload,
            Screen::Chat(_) => panic!("expected upload screen"),
        }
    }

    pub fn chat_screen(&mut self) -> &mut ChatScreen {
        match &mut self.screen {
            Screen::Chat(chat) => chat,
            Screen::Upload(_) => panic!("expected chat screen"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::ChatRole;
    use serde_json::json;
    use std::path::PathBuf;

    fn upload_body(filename: &str) -> String {
        json!({
            "id": "doc-1",
            "filename": filename,
            "contentType": "application/pdf",
            "size": 2097152,
            "totalChunks": 3,
            "chunks": ["c1", "c2", "c3"],
            "metadata": {"author": "User"},
            "createdAt": "2024-05-01T10:00:00"
        })
        .to_string()
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, size: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut bytes = b"%PDF-1.4\n".to_vec();
        bytes.resize(size, b' ');
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_report_scenario() {
        let mut server = mockito::Server::new_async().await;
        let upload_mock = server
            .mock("POST", "/documents/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(upload_body("report.pdf"))
            .expect(1)
            .create_async()
            .await;
        let query_mock = server
            .mock("POST", "/query")
            .match_body(mockito::Matcher::Json(json!({"question": "What is the summary?"})))
            .with_status(200)
            .with_body("The document discusses X.")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "report.pdf", 2 * 1024 * 1024);

        let api = ApiClient::new(&server.url());
        let mut app = App::new(api.clone());
        app.drop_path(&path.display().to_string());
        assert!(app.upload_screen().form.is_uploading());
        app.settle().await;

        let chat = app.chat_screen();
        assert_eq!(chat.document_name, "report.pdf");
        assert_eq!(chat.document.id, "doc-1");
        assert!(chat.transcript.messages()[0].content.contains("\"report.pdf\""));

        chat.input = "What is the summary?".to_string();
        assert!(chat.submit(&api));
        app.settle().await;

        let messages = app.chat_screen().transcript.messages().to_vec();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "What is the summary?");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, "The document discusses X.");

        upload_mock.assert_async().await;
        query_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_pdf_never_reaches_network() {
        let mut server = mockito::Server::new_async().await;
        let upload_mock = server
            .mock("POST", "/documents/upload")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "image.png", 100);

        let mut app = App::new(ApiClient::new(&server.url()));
        app.drop_path(&path.display().to_string());
        app.settle().await;

        let upload = app.upload_screen();
        assert_eq!(upload.form.display_error(), Some("Please select a valid PDF file"));
        assert!(upload.form.selected().is_none());
        assert!(app.upload_task.is_none());
        upload_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_selection_and_allows_retry() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/documents/upload")
            .with_status(500)
            .with_body("disk full")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.pdf", 64);

        let mut app = App::new(ApiClient::new(&server.url()));
        if let Screen::Upload(upload) = &mut app.screen {
            upload.path_input = path.display().to_string();
        }
        app.submit_path();
        app.settle().await;

        let upload = app.upload_screen();
        assert!(!upload.form.is_uploading());
        assert_eq!(upload.form.display_error(), Some("Upload failed: disk full"));
        assert_eq!(upload.form.selected().unwrap().name, "notes.pdf");
        failing.assert_async().await;

        let mut healthy = mockito::Server::new_async().await;
        healthy
            .mock("POST", "/documents/upload")
            .with_status(200)
            .with_body(upload_body("notes.pdf"))
            .create_async()
            .await;
        app.api = ApiClient::new(&healthy.url());

        app.retry_upload();
        app.settle().await;
        assert_eq!(app.chat_screen().document_name, "notes.pdf");
    }

    #[tokio::test]
    async fn test_query_failure_appends_error_and_reenables_input() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query")
            .with_status(500)
            .with_body("model offline")
            .create_async()
            .await;

        let mut app = App::new(ApiClient::new(&server.url()));
        app.screen = Screen::Chat(ChatScreen::new(Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_str(&upload_body("a.pdf")).unwrap(),
        }));

        let api = app.api.clone();
        let chat = app.chat_screen();
        chat.input = "Anything?".to_string();
        assert!(chat.submit(&api));
        assert!(app.is_busy());
        app.settle().await;

        assert!(!app.is_busy());
        let messages = app.chat_screen().transcript.messages().to_vec();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[2].content,
            "Sorry, I encountered an error: Query failed: model offline"
        );
    }

    #[tokio::test]
    async fn test_blank_question_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let query_mock = server.mock("POST", "/query").expect(0).create_async().await;

        let mut app = App::new(ApiClient::new(&server.url()));
        app.screen = Screen::Chat(ChatScreen::new(Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_str(&upload_body("a.pdf")).unwrap(),
        }));

        let api = app.api.clone();
        let chat = app.chat_screen();
        chat.input = "   ".to_string();
        assert!(!chat.submit(&api));
        assert!(chat.query_task.is_none());
        assert_eq!(chat.transcript.messages().len(), 1);
        query_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_back_to_upload_discards_chat() {
        let server = mockito::Server::new_async().await;
        let mut app = App::new(ApiClient::new(&server.url()));
        app.screen = Screen::Chat(ChatScreen::new(Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_str(&upload_body("a.pdf")).unwrap(),
        }));

        app.back_to_upload();
        app.settle().await;

        let upload = app.upload_screen();
        assert!(upload.form.selected().is_none());
        assert!(upload.form.display_error().is_none());
    }

    #[tokio::test]
    async fn test_answer_arriving_after_leaving_chat_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_body("Too late.")
            .create_async()
            .await;

        let mut app = App::new(ApiClient::new(&server.url()));
        app.screen = Screen::Chat(ChatScreen::new(Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_str(&upload_body("a.pdf")).unwrap(),
        }));

        let api = app.api.clone();
        let chat = app.chat_screen();
        chat.input = "Still there?".to_string();
        assert!(chat.submit(&api));
        assert!(app.is_busy());

        app.back_to_upload();
        app.settle().await;
        app.poll_tasks().await;

        assert!(matches!(app.screen, Screen::Upload(_)));
        assert!(!app.is_busy());
        let upload = app.upload_screen();
        assert!(upload.form.selected().is_none());
        assert!(upload.form.display_error().is_none());
        assert!(app.upload_task.is_none());
    }

    #[test]
    fn test_manual_scroll_stops_following_until_bottom() {
        let mut chat = ChatScreen::new(Handoff {
            document_name: "a.pdf".to_string(),
            upload: serde_json::from_str(&upload_body("a.pdf")).unwrap(),
        });
        chat.set_viewport(30, 10);
        assert_eq!(chat.scroll, 20);

        chat.scroll_page_up();
        assert!(!chat.follow_bottom);
        assert_eq!(chat.scroll, 15);

        // A longer transcript does not drag a reader who scrolled up
        chat.set_viewport(40, 10);
        assert_eq!(chat.scroll, 15);

        chat.scroll_page_down();
        chat.scroll_page_down();
        chat.scroll_page_down();
        assert_eq!(chat.scroll, 30);
        assert!(chat.follow_bottom);

        chat.set_viewport(45, 10);
        assert_eq!(chat.scroll, 35);

        chat.scroll_to_top();
        chat.set_viewport(3, 10);
        assert_eq!(chat.scroll, 0);
    }
}
