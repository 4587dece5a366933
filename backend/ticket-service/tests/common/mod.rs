//! In-memory fakes shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use ticket_service::error::{AppError, Result};
use ticket_service::middleware::{Claims, JwtKeys};
use ticket_service::models::{
    Comment, CommentView, FileRecord, Message, MessageView, NewFile, NewTicket, NewUserDefaults,
    Role, Ticket, TicketStatus, TicketUpdate, User,
};
use ticket_service::services::{
    MailTransport, NotificationJob, NotificationQueue, ObjectStore, OutboundMail,
};
use ticket_service::store::{TicketStore, TicketUpdateOutcome};
use ticket_service::AppState;

pub const JWT_SECRET: &str = "test-secret";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tickets: Vec<Ticket>,
    messages: Vec<Message>,
    comments: Vec<Comment>,
    files: Vec<FileRecord>,
    next_id: i64,
    clock: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps, one second apart
    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::seconds(self.clock)
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// Pauses one `list_messages` call so a test can act mid-read
struct HistoryGate {
    after_read: bool,
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

impl HistoryGate {
    async fn pause(self) {
        let _ = self.entered.send(());
        let _ = self.release.await;
    }
}

/// `TicketStore` over plain vectors. Every operation holds one lock, so each
/// is atomic like the single SQL statements it stands in for.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    history_gate: Mutex<Option<HistoryGate>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, email: &str, notifications: bool, extras: &[&str]) -> User {
        let mut t = self.tables.lock().unwrap();
        let user = User {
            id: t.next_id(),
            email: email.to_string(),
            name: None,
            role: Role::Customer,
            email_notifications_enabled: notifications,
            extra_emails: extras.iter().map(|e| e.to_string()).collect(),
            company_id: None,
            created_at: t.now(),
        };
        t.users.push(user.clone());
        user
    }

    pub fn add_ticket(&self, owner: &User, cc: &[&str]) -> Ticket {
        let mut t = self.tables.lock().unwrap();
        let ticket = Ticket {
            id: t.next_id(),
            title: "Printer offline".into(),
            content: "It stopped printing".into(),
            status: TicketStatus::Open,
            user_id: owner.id,
            cc: cc.iter().map(|e| e.to_string()).collect(),
            company_id: None,
            created_at: t.now(),
        };
        t.tickets.push(ticket.clone());
        ticket
    }

    pub fn users_with_email(&self, email: &str) -> usize {
        let t = self.tables.lock().unwrap();
        t.users.iter().filter(|u| u.email == email).count()
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }

    pub fn ticket_count(&self) -> usize {
        self.tables.lock().unwrap().tickets.len()
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.tables.lock().unwrap().files.clone()
    }

    /// Make the next `list_messages` stop either before or after it reads the
    /// table. The first receiver fires once it has stopped; sending on the
    /// returned sender lets it finish.
    pub fn pause_next_history(&self, after_read: bool) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.history_gate.lock().unwrap() = Some(HistoryGate {
            after_read,
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    fn read_messages(&self, ticket_id: i64) -> Vec<MessageView> {
        let t = self.tables.lock().unwrap();
        let mut views: Vec<MessageView> = t
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .map(|m| {
                let sender = t.user(m.user_id);
                let file = t.files.iter().find(|f| f.message_id == Some(m.id));
                MessageView {
                    id: m.id,
                    ticket_id: m.ticket_id,
                    user_id: m.user_id,
                    sender_email: sender.map(|u| u.email.clone()).unwrap_or_default(),
                    sender_name: sender.and_then(|u| u.name.clone()),
                    content: m.content.clone(),
                    created_at: m.created_at,
                    file_name: file.map(|f| f.filename.clone()),
                    file_url: file.map(|f| f.url.clone()),
                }
            })
            .collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        views
    }
}

#[async_trait]
impl TicketStore for InMemoryStore {
    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.lock().unwrap().user(id).cloned())
    }

    async fn upsert_user(&self, email: &str, defaults: &NewUserDefaults) -> Result<User> {
        let mut t = self.tables.lock().unwrap();
        if let Some(existing) = t.users.iter().find(|u| u.email == email) {
            return Ok(existing.clone());
        }
        let user = User {
            id: t.next_id(),
            email: email.to_string(),
            name: defaults.name.clone(),
            role: defaults.role,
            email_notifications_enabled: true,
            extra_emails: vec![],
            company_id: None,
            created_at: t.now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        let mut t = self.tables.lock().unwrap();
        let created = Ticket {
            id: t.next_id(),
            title: ticket.title.clone(),
            content: ticket.content.clone(),
            status: TicketStatus::INITIAL,
            user_id: ticket.user_id,
            cc: ticket.cc.clone(),
            company_id: ticket.company_id,
            created_at: t.now(),
        };
        t.tickets.push(created.clone());
        Ok(created)
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let t = self.tables.lock().unwrap();
        Ok(t.tickets.iter().find(|x| x.id == id).cloned())
    }

    async fn find_ticket_with_owner(&self, id: i64) -> Result<Option<(Ticket, User)>> {
        let t = self.tables.lock().unwrap();
        Ok(t.tickets.iter().find(|x| x.id == id).and_then(|ticket| {
            t.user(ticket.user_id)
                .map(|owner| (ticket.clone(), owner.clone()))
        }))
    }

    async fn list_tickets(&self, owner: Option<i64>) -> Result<Vec<Ticket>> {
        let t = self.tables.lock().unwrap();
        let mut tickets: Vec<Ticket> = t
            .tickets
            .iter()
            .filter(|x| owner.map_or(true, |o| x.user_id == o))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tickets)
    }

    async fn update_ticket(
        &self,
        id: i64,
        fields: &TicketUpdate,
    ) -> Result<Option<TicketUpdateOutcome>> {
        let mut t = self.tables.lock().unwrap();
        let Some(ticket) = t.tickets.iter_mut().find(|x| x.id == id) else {
            return Ok(None);
        };
        let previous = ticket.clone();
        if let Some(title) = &fields.title {
            ticket.title = title.clone();
        }
        if let Some(content) = &fields.content {
            ticket.content = content.clone();
        }
        if let Some(status) = fields.status {
            ticket.status = status;
        }
        if let Some(cc) = &fields.cc {
            ticket.cc = cc.clone();
        }
        if let Some(company) = fields.company_id {
            ticket.company_id = company;
        }
        Ok(Some(TicketUpdateOutcome {
            previous,
            current: ticket.clone(),
        }))
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.tickets.len();
        t.tickets.retain(|x| x.id != id);
        if t.tickets.len() == before {
            return Ok(false);
        }
        let message_ids: Vec<i64> = t
            .messages
            .iter()
            .filter(|m| m.ticket_id == id)
            .map(|m| m.id)
            .collect();
        t.messages.retain(|m| m.ticket_id != id);
        t.comments.retain(|c| c.ticket_id != id);
        t.files.retain(|f| {
            f.ticket_id != Some(id) && !f.message_id.is_some_and(|m| message_ids.contains(&m))
        });
        Ok(true)
    }

    async fn create_message(
        &self,
        ticket_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Message> {
        let mut t = self.tables.lock().unwrap();
        if !t.tickets.iter().any(|x| x.id == ticket_id) {
            // Stands in for the foreign-key violation.
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        let message = Message {
            id: t.next_id(),
            ticket_id,
            user_id,
            content: content.to_string(),
            created_at: t.now(),
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn delete_message(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.messages.len();
        t.messages.retain(|m| m.id != id);
        t.files.retain(|f| f.message_id != Some(id));
        Ok(t.messages.len() != before)
    }

    async fn list_messages(&self, ticket_id: i64) -> Result<Vec<MessageView>> {
        let gate = self.history_gate.lock().unwrap().take();
        let (before, after) = match gate {
            Some(gate) if gate.after_read => (None, Some(gate)),
            gate => (gate, None),
        };
        if let Some(gate) = before {
            gate.pause().await;
        }
        let views = self.read_messages(ticket_id);
        if let Some(gate) = after {
            gate.pause().await;
        }
        Ok(views)
    }

    async fn create_file(&self, file: &NewFile) -> Result<FileRecord> {
        let mut t = self.tables.lock().unwrap();
        let record = FileRecord {
            id: t.next_id(),
            filename: file.filename.clone(),
            url: file.url.clone(),
            size: file.size,
            message_id: file.owner.message_id(),
            ticket_id: file.owner.ticket_id(),
            uploaded_by_id: file.uploaded_by,
            created_at: t.now(),
        };
        t.files.push(record.clone());
        Ok(record)
    }

    async fn list_ticket_files(&self, ticket_id: i64) -> Result<Vec<FileRecord>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .files
            .iter()
            .filter(|f| f.ticket_id == Some(ticket_id))
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        ticket_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let mut t = self.tables.lock().unwrap();
        let comment = Comment {
            id: t.next_id(),
            ticket_id,
            user_id,
            content: content.to_string(),
            created_at: t.now(),
        };
        t.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Option<Comment>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.content = content.to_string();
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.comments.len();
        t.comments.retain(|c| c.id != id);
        Ok(t.comments.len() != before)
    }

    async fn list_comments(&self, ticket_id: i64) -> Result<Vec<CommentView>> {
        let t = self.tables.lock().unwrap();
        let mut views: Vec<CommentView> = t
            .comments
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .map(|c| {
                let author = t.user(c.user_id);
                CommentView {
                    id: c.id,
                    ticket_id: c.ticket_id,
                    user_id: c.user_id,
                    author_email: author.map(|u| u.email.clone()).unwrap_or_default(),
                    author_name: author.and_then(|u| u.name.clone()),
                    content: c.content.clone(),
                    created_at: c.created_at,
                }
            })
            .collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(views)
    }
}

/// Object store that keeps keys in memory and can be told to fail
#[derive(Default)]
pub struct MemoryObjectStore {
    pub fail_puts: AtomicBool,
    pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_puts.store(true, Ordering::SeqCst);
        store
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::Storage("object store unavailable".into()));
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), bytes, content_type.to_string()));
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("http://minio.test/ticket-files/{key}")
    }
}

/// Mail transport that records everything it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundMail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: OutboundMail) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Mail("smtp down".into()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Everything a test needs, wired like production but in memory
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub state: AppState,
    pub jobs: mpsc::Receiver<NotificationJob>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_objects(MemoryObjectStore::default())
    }

    pub fn with_objects(objects: MemoryObjectStore) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let objects = Arc::new(objects);
        let (queue, jobs) = NotificationQueue::bounded(64);
        let state = AppState::new(
            store.clone(),
            objects.clone(),
            queue,
            JwtKeys::new(JWT_SECRET),
        );
        Self {
            store,
            objects,
            state,
            jobs,
        }
    }

    /// Jobs queued so far
    pub fn drain_jobs(&mut self) -> Vec<NotificationJob> {
        let mut jobs = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            jobs.push(job);
        }
        jobs
    }
}

pub fn token_for(user: &User, role: Role) -> String {
    let claims = Claims {
        id: user.id,
        role,
        email: user.email.clone(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
