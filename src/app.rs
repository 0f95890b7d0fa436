use std::time::Duration;
use tokio::sync::mpsc;
use tably_core::{
    AnalysisClient, Conversation, ConversationPhase, Effect, Loader, LoaderTransition, Outcome,
    PresentationKind,
};
use crate::tui::{AppEvent, LoaderTicker};

pub struct App {
    // Core state
    pub should_quit: bool,
    pub conversation: Conversation,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub format_cursor: usize, // highlighted entry in the format picker

    // Chat scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_total_lines: u16,
    pub follow_tail: bool,

    // Loader state
    pub loader: Loader,
    loader_ticker: Option<LoaderTicker>,
    loader_interval: Duration,

    // Gateway
    client: AnalysisClient,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        client: AnalysisClient,
        events: mpsc::UnboundedSender<AppEvent>,
        loader_interval: Duration,
    ) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),

            input: String::new(),
            input_cursor: 0,
            format_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            follow_tail: true,

            loader: Loader::new(),
            loader_ticker: None,
            loader_interval,

            client,
            events,
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        self.conversation.phase()
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }

    /// Send the input box contents. Blank input or a non-idle conversation leaves the box untouched.
    pub fn submit_input(&mut self) {
        let effect = self.conversation.submit(&self.input);
        if effect.is_some() {
            self.input.clear();
            self.input_cursor = 0;
            self.format_cursor = 0;
            self.follow_tail = true;
        }
        self.dispatch(effect);
    }

    pub fn choose_format(&mut self, kind: PresentationKind) {
        let effect = self.conversation.choose_format(kind);
        if effect.is_some() {
            self.follow_tail = true;
        }
        self.dispatch(effect);
    }

    pub fn choose_highlighted_format(&mut self) {
        if let Some(kind) = PresentationKind::ALL.get(self.format_cursor).copied() {
            self.choose_format(kind);
        }
    }

    pub fn format_next(&mut self) {
        self.format_cursor = (self.format_cursor + 1) % PresentationKind::ALL.len();
    }

    pub fn format_prev(&mut self) {
        let len = PresentationKind::ALL.len();
        self.format_cursor = (self.format_cursor + len - 1) % len;
    }

    pub fn abandon_format(&mut self) {
        if self.conversation.abandon() {
            self.format_cursor = 0;
        }
    }

    /// Feed a finished request back into the conversation
    pub fn on_outcome(&mut self, outcome: Outcome) {
        if self.conversation.apply(outcome) {
            self.follow_tail = true;
        }
        self.sync_loader();
    }

    /// Tick loader animation (called by LoaderTick event)
    pub fn tick_loader(&mut self) {
        self.loader.advance();
    }

    fn dispatch(&mut self, effect: Option<Effect>) {
        if let Some(effect) = effect {
            let client = self.client.clone();
            let tx = self.events.clone();
            tokio::spawn(async move {
                let outcome = client.execute(effect).await;
                if tx.send(AppEvent::Outcome(outcome)).is_err() {
                    tracing::debug!("Event loop gone, dropping gateway outcome");
                }
            });
        }
        self.sync_loader();
    }

    /// Start or stop the loader timer so it runs exactly while the conversation is busy
    fn sync_loader(&mut self) {
        match self.loader.sync(self.conversation.is_busy()) {
            Some(LoaderTransition::Started) => {
                self.loader_ticker = Some(LoaderTicker::spawn(self.events.clone(), self.loader_interval));
            }
            Some(LoaderTransition::Stopped) => {
                self.loader_ticker = None;
            }
            None => {}
        }
    }

    pub fn loader_running(&self) -> bool {
        self.loader_ticker.is_some()
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
        if self.chat_scroll >= max_scroll {
            self.follow_tail = true;
        }
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }
}
