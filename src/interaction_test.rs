#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::accounts::AccountRecord;
    use crate::fake_session::{Action, FakeNode, FakeSession};
    use crate::login::BasicLogin;
    use pretty_assertions::assert_eq;

    const IDENTITY: &str = "alice@example.com";

    fn chat(session: FakeSession) -> ChatInteraction<FakeSession> {
        ChatInteraction::new(ElementInteractor::new(session), AccountStore::default())
    }

    /// Chat input, send button, a generating indicator and one earlier reply
    fn add_chat_page(session: &FakeSession, reply: FakeNode) {
        session.add_css(CHAT_INPUT);
        session.add_css(SEND_BUTTON);
        // Seen by the probe and the first disappearance poll only
        session.add(FakeNode::new(Selector::css(STOP_BUTTON)).vanishes_after(2));
        session.add(FakeNode::new(Selector::css(RESPONSE)).text("Earlier reply"));
        // Counted from the second lookup on, after the send
        session.add(reply.appears_after(1));
    }

    fn chat_page(reply: &str) -> FakeSession {
        let session = FakeSession::new();
        add_chat_page(&session, FakeNode::new(Selector::css(RESPONSE)).text(reply));
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_with_unknown_account() {
        let session = FakeSession::new();
        session.add_css(LOGIN_BUTTON);
        let chat = chat(session);

        assert!(!chat.login("nobody@example.com").await);
        assert_eq!(
            chat.interactor()
                .session()
                .clicks_on(&Selector::css(LOGIN_BUTTON)),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_delegates_to_account_strategy() {
        let form = BasicLogin::default();
        let session = FakeSession::new();
        session.add_css(LOGIN_BUTTON);
        for selector in [
            &form.email_input,
            &form.continue_button,
            &form.password_input,
            &form.submit_button,
        ] {
            session.add(FakeNode::new(selector.clone()));
        }
        let accounts = AccountStore::from_records([(IDENTITY, AccountRecord::new("hunter2"))]);
        let chat = ChatInteraction::new(ElementInteractor::new(session), accounts);

        assert!(chat.login(IDENTITY).await);

        let page = chat.interactor().session();
        assert_eq!(page.clicks_on(&Selector::css(LOGIN_BUTTON)), 1);
        assert_eq!(page.typed_into(&form.email_input), IDENTITY);
        assert_eq!(page.typed_into(&form.password_input), "hunter2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_without_login_button_still_tries() {
        let form = BasicLogin::default();
        let session = FakeSession::new();
        session.add(FakeNode::new(form.email_input.clone()));
        let accounts = AccountStore::from_records([(IDENTITY, AccountRecord::new("hunter2"))]);
        let chat = ChatInteraction::new(ElementInteractor::new(session), accounts);

        // No continue button, so the basic flow stops after typing the email
        assert!(!chat.login(IDENTITY).await);
        assert_eq!(
            chat.interactor().session().typed_into(&form.email_input),
            IDENTITY
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_reads_response_text() {
        let chat = chat(chat_page("Forty-two."));

        let response = chat.send_message("What is the meaning of life?").await;

        assert_eq!(response.as_deref(), Some("Forty-two."));
        let page = chat.interactor().session();
        assert_eq!(
            page.typed_into(&Selector::css(CHAT_INPUT)),
            "What is the meaning of life?"
        );
        assert_eq!(page.clicks_on(&Selector::css(SEND_BUTTON)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_types_one_key_at_a_time() {
        let chat = chat(chat_page("ok"));

        chat.send_message("héllo").await;

        let keystrokes = chat
            .interactor()
            .session()
            .actions()
            .into_iter()
            .filter(|action| matches!(action, Action::Typed(..)))
            .count();
        assert_eq!(keystrokes, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_without_input() {
        let chat = chat(FakeSession::new());

        assert_eq!(chat.send_message("Hello").await, None);
        assert!(chat.interactor().session().actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_without_new_response() {
        let session = FakeSession::new();
        session.add_css(CHAT_INPUT);
        session.add_css(SEND_BUTTON);
        session.add(FakeNode::new(Selector::css(RESPONSE)).text("Earlier reply"));
        let chat = chat(session);

        assert_eq!(chat.send_message("Hello").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_while_still_generating() {
        let session = FakeSession::new();
        session.add_css(CHAT_INPUT);
        session.add_css(SEND_BUTTON);
        session.add_css(STOP_BUTTON);
        let chat = chat(session).with_response_timeout(Duration::from_secs(30));
        let start = tokio::time::Instant::now();

        assert_eq!(chat.send_message("Hi").await, None);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clipboard_retrieval() {
        let session = FakeSession::new();
        let turn = session.add(FakeNode::new(Selector::css("article")));
        let reply = FakeNode::new(Selector::css(RESPONSE))
            .text("Visible text")
            .within(turn);
        add_chat_page(&session, reply);
        session.add(FakeNode::new(Selector::xpath(COPY_BUTTON)).within(turn));
        session.set_clipboard("**Copied** markdown");
        let chat = chat(session).with_retrieval(ResponseRetrieval::Clipboard);

        let response = chat.send_message("Hello").await;

        assert_eq!(response.as_deref(), Some("**Copied** markdown"));
        assert_eq!(
            chat.interactor()
                .session()
                .clicks_on(&Selector::xpath(COPY_BUTTON)),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clipboard_retrieval_falls_back_to_text() {
        let session = chat_page("Visible text");
        session.set_clipboard("never read");
        let chat = chat(session).with_retrieval(ResponseRetrieval::Clipboard);

        // The newest response has no copy button anywhere above it
        let response = chat.send_message("Hello").await;

        assert_eq!(response.as_deref(), Some("Visible text"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_temporary_chat() {
        let steps = TemporaryChat::default();
        let session = FakeSession::new();
        session.add(FakeNode::new(steps.menu_button.clone()));
        session.add(FakeNode::new(steps.switch.clone()));
        session.add(FakeNode::new(steps.continue_button.clone()));
        session.add(FakeNode::new(steps.marker.clone()));
        let chat = chat(session);

        assert!(chat.enable_temporary_chat().await);

        let page = chat.interactor().session();
        assert_eq!(page.clicks_on(&steps.menu_button), 1);
        assert_eq!(page.clicks_on(&steps.switch), 1);
        assert_eq!(page.clicks_on(&steps.continue_button), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_temporary_chat_without_popup() {
        let steps = TemporaryChat::default();
        let session = FakeSession::new();
        session.add(FakeNode::new(steps.menu_button.clone()));
        session.add(FakeNode::new(steps.switch.clone()));
        session.add(FakeNode::new(steps.marker.clone()));
        let chat = chat(session);

        assert!(chat.enable_temporary_chat().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_temporary_chat_without_marker() {
        let steps = TemporaryChat::default();
        let session = FakeSession::new();
        session.add(FakeNode::new(steps.menu_button.clone()));
        session.add(FakeNode::new(steps.switch.clone()));
        let chat = chat(session);

        assert!(!chat.enable_temporary_chat().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_visits_url() {
        let chat = chat(FakeSession::new());

        chat.open("https://chatgpt.com").await.unwrap();

        assert_eq!(
            chat.interactor().session().actions(),
            vec![Action::Visit("https://chatgpt.com".to_string())]
        );
    }
}
