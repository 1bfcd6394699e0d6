// SPDX-License-Identifier: Apache-2.0

//! Protocol behavior of the mutation client against an in-process fake
//! server that runs the real merge engine.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use waypoint_api::{
    api_error_from_update, ApiError, CommentRequest, StoryboardRequest, StoryboardResponse,
};
use waypoint_client::{
    BoardTransport, EntryStatus, MutationClient, Notifier, SubmitError, SubmitOptions,
    TransportError,
};
use waypoint_engine::{
    append_comment, apply_patch, set_storyboard, FixedClock, NewComment, UpdateError,
};
use waypoint_model::{
    parse_block_id, parse_board_id, parse_column_id, parse_comment_id, parse_phase_id,
    parse_user_id, Block, BlockId, Board, BoardFragment, BoardId, BoardStatus, Column, ColumnId,
    Phase, UserId,
};

const SERVER_NOW: u64 = 9_000;

/// Engine-backed stand-in for the HTTP server: one board slot, a fixed
/// clock, and a switch that fails the next request.
struct FakeTransport {
    board: Mutex<Option<Board>>,
    actor: UserId,
    fail_next: AtomicBool,
    fetches: AtomicUsize,
    comment_seq: AtomicUsize,
}

impl FakeTransport {
    fn seeded(board: Board, actor: &str) -> Self {
        Self {
            board: Mutex::new(Some(board)),
            actor: parse_user_id(actor).expect("actor"),
            fail_next: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            comment_seq: AtomicUsize::new(0),
        }
    }

    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn server_board(&self) -> Board {
        self.board.lock().expect("lock").clone().expect("seeded")
    }

    fn check_injected_failure(&self) -> Result<(), TransportError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Network("connection reset".into()));
        }
        Ok(())
    }

    fn reject(&self, err: UpdateError) -> TransportError {
        let error = api_error_from_update(&err, "req-fake");
        TransportError::Api {
            status: error.code.http_status(),
            error,
        }
    }

    fn stored(&self, id: &BoardId) -> Result<Board, TransportError> {
        match self.board.lock().expect("lock").as_ref() {
            Some(board) if board.id == *id => Ok(board.clone()),
            _ => {
                let error = ApiError::not_found("board", id.as_str(), "req-fake");
                Err(TransportError::Api {
                    status: error.code.http_status(),
                    error,
                })
            }
        }
    }

    fn commit(&self, board: Board) {
        *self.board.lock().expect("lock") = Some(board);
    }
}

#[async_trait]
impl BoardTransport for FakeTransport {
    async fn fetch_board(&self, id: &BoardId) -> Result<Board, TransportError> {
        self.check_injected_failure()?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.stored(id)
    }

    async fn put_board(&self, board: &Board) -> Result<Board, TransportError> {
        self.check_injected_failure()?;
        let mut next = board.clone();
        next.updated_at = SERVER_NOW;
        if next.created_at == 0 {
            next.created_at = SERVER_NOW;
        }
        self.commit(next.clone());
        Ok(next)
    }

    async fn patch_board(
        &self,
        id: &BoardId,
        fragment: &BoardFragment,
    ) -> Result<Board, TransportError> {
        self.check_injected_failure()?;
        let stored = self.stored(id)?;
        let merged = apply_patch(&stored, fragment, &self.actor, &FixedClock(SERVER_NOW))
            .map_err(|e| self.reject(UpdateError::Merge(e)))?;
        self.commit(merged.clone());
        Ok(merged)
    }

    async fn post_comment(
        &self,
        id: &BoardId,
        block: &BlockId,
        comment: &CommentRequest,
    ) -> Result<Board, TransportError> {
        self.check_injected_failure()?;
        let stored = self.stored(id)?;
        let seq = self.comment_seq.fetch_add(1, Ordering::SeqCst);
        let new = NewComment {
            id: parse_comment_id(&format!("srv-cmt-{seq}")).expect("comment id"),
            content: comment.content.clone(),
            user_id: comment.user_id.clone(),
            author_name: comment.author_name.clone(),
        };
        let merged = append_comment(&stored, block, new, &self.actor, &FixedClock(SERVER_NOW))
            .map_err(|e| self.reject(UpdateError::Merge(e)))?;
        self.commit(merged.clone());
        Ok(merged)
    }

    async fn generate_storyboard(
        &self,
        id: &BoardId,
        column: &ColumnId,
        request: &StoryboardRequest,
    ) -> Result<StoryboardResponse, TransportError> {
        self.check_injected_failure()?;
        let stored = self.stored(id)?;
        let pair = request
            .prompt
            .clone()
            .map(|p| (p.clone(), format!("https://images.invalid/{p}.png")));
        let merged = set_storyboard(&stored, column, pair, &self.actor, &FixedClock(SERVER_NOW))
            .map_err(|e| self.reject(UpdateError::Merge(e)))?;
        self.commit(merged.clone());
        let updated = merged.find_column(column).expect("column").clone();
        Ok(StoryboardResponse {
            column_id: column.clone(),
            image_url: updated.storyboard_image_url,
            prompt: updated.storyboard_prompt,
            board: merged,
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<(&'static str, String)> {
        self.events.lock().expect("lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.events
            .lock()
            .expect("lock")
            .push(("success", message.to_string()));
    }

    fn failure(&self, message: &str) {
        self.events
            .lock()
            .expect("lock")
            .push(("failure", message.to_string()));
    }
}

fn sample_board() -> Board {
    let mut board = Board::new(
        parse_board_id("b1").expect("id"),
        "Checkout journey",
        parse_user_id("u1").expect("owner"),
    );
    board.created_at = 100;
    board.updated_at = 100;
    board.phases = vec![Phase {
        id: parse_phase_id("p1").expect("id"),
        name: "Purchase".into(),
        columns: vec![Column::new(parse_column_id("c1").expect("id"), "Pay")],
    }];
    board.blocks = vec![Block {
        id: parse_block_id("blk1").expect("id"),
        column_id: parse_column_id("c1").expect("id"),
        content: "Customer pays".into(),
        lane: "customer-action".into(),
        comments: vec![],
    }];
    board
}

struct Harness {
    client: MutationClient,
    transport: Arc<FakeTransport>,
    notifier: Arc<RecordingNotifier>,
}

fn harness() -> Harness {
    let transport = Arc::new(FakeTransport::seeded(sample_board(), "u1"));
    let notifier = Arc::new(RecordingNotifier::default());
    let client = MutationClient::new(
        transport.clone(),
        notifier.clone(),
        parse_user_id("u1").expect("actor"),
        "Uli",
    );
    Harness {
        client,
        transport,
        notifier,
    }
}

fn bid() -> BoardId {
    parse_board_id("b1").expect("id")
}

#[tokio::test]
async fn get_board_fetches_once_then_serves_from_cache() {
    let h = harness();
    let first = h.client.get_board(&bid()).await.expect("fetch");
    let second = h.client.get_board(&bid()).await.expect("cached");
    assert_eq!(first, second);
    assert_eq!(h.transport.fetches.load(Ordering::SeqCst), 1);

    h.client.invalidate(&bid()).await;
    h.client.get_board(&bid()).await.expect("refetch");
    assert_eq!(h.transport.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn successful_submit_confirms_the_canonical_copy() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    let board = h
        .client
        .set_status(&bid(), BoardStatus::Review)
        .await
        .expect("submit");
    assert_eq!(board.status, BoardStatus::Review);
    // The canonical copy carries the server timestamp the optimistic guess
    // could not have known.
    assert_eq!(board.updated_at, SERVER_NOW);

    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::Confirmed);
    assert_eq!(entry.board, h.transport.server_board());
    assert_eq!(
        h.notifier.events(),
        vec![("success", "board updated".to_string())]
    );
}

#[tokio::test]
async fn failed_submit_leaves_optimistic_state_marked_diverged() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");
    h.transport.fail_next();

    let err = h
        .client
        .set_status(&bid(), BoardStatus::Complete)
        .await
        .expect_err("transport down");
    assert!(matches!(
        err,
        SubmitError::Transport(TransportError::Network(_))
    ));

    // No rollback: the entry still shows the optimistic status, flagged so
    // the UI knows the server never accepted it.
    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::DivergedOnError);
    assert_eq!(entry.board.status, BoardStatus::Complete);
    assert_eq!(h.transport.server_board().status, BoardStatus::Draft);
    assert_eq!(h.notifier.events().len(), 1);
    assert_eq!(h.notifier.events()[0].0, "failure");
}

#[tokio::test]
async fn rejected_submit_is_surfaced_with_the_server_taxonomy() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    // Dangling columnId: the engine rejects the merge, so the server copy
    // stays put while the cache diverges.
    let mut blocks = h.transport.server_board().blocks;
    blocks[0].column_id = parse_column_id("c9").expect("id");
    let err = h
        .client
        .replace_blocks(&bid(), blocks)
        .await
        .expect_err("validation");
    match err {
        SubmitError::Transport(TransportError::Api { status, error }) => {
            assert_eq!(status, 422);
            assert_eq!(error.code.as_str(), "validation_failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::DivergedOnError);
}

#[tokio::test]
async fn structural_replaces_are_silent() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    let reordered: Vec<Block> = h.transport.server_board().blocks;
    h.client
        .replace_blocks(&bid(), reordered)
        .await
        .expect("replace");
    let phases = h.transport.server_board().phases;
    h.client
        .replace_phases(&bid(), phases)
        .await
        .expect("replace");
    assert!(h.notifier.events().is_empty());

    // Non-silent paths still announce.
    h.client.rename(&bid(), "Return journey").await.expect("rename");
    assert_eq!(h.notifier.events().len(), 1);
}

#[tokio::test]
async fn deleting_a_block_by_omission_round_trips() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    h.client.replace_blocks(&bid(), vec![]).await.expect("clear");
    assert!(h.transport.server_board().blocks.is_empty());
    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert!(entry.board.blocks.is_empty());
}

#[tokio::test]
async fn append_comment_reconciles_the_server_assigned_identity() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    let block = parse_block_id("blk1").expect("id");
    let board = h
        .client
        .append_comment(&bid(), &block, "looks wrong")
        .await
        .expect("comment");

    let comments = &board.find_block(&block).expect("block").comments;
    assert_eq!(comments.len(), 1);
    // The optimistic placeholder id is discarded for the server's.
    assert_eq!(comments[0].id.as_str(), "srv-cmt-0");
    assert_eq!(comments[0].created_at, SERVER_NOW);
    assert_eq!(comments[0].author_name, "Uli");

    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::Confirmed);
    assert_eq!(entry.board, board);
}

#[tokio::test]
async fn append_comment_to_unknown_block_diverges_without_mutation() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");

    let missing = parse_block_id("blk9").expect("id");
    let err = h
        .client
        .append_comment(&bid(), &missing, "lost")
        .await
        .expect_err("unknown block");
    match err {
        SubmitError::Transport(TransportError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.transport.server_board().blocks[0].comments.is_empty());
    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::DivergedOnError);
}

#[tokio::test]
async fn storyboard_attach_then_detach_moves_the_pair_together() {
    let h = harness();
    h.client.get_board(&bid()).await.expect("warm cache");
    let column = parse_column_id("c1").expect("id");

    let attached = h
        .client
        .attach_storyboard(&bid(), &column, "a paying customer")
        .await
        .expect("attach");
    assert_eq!(attached.prompt.as_deref(), Some("a paying customer"));
    assert_eq!(
        attached.image_url.as_deref(),
        Some("https://images.invalid/a paying customer.png")
    );
    let column_state = attached.board.find_column(&column).expect("column");
    assert!(column_state.storyboard_image_url.is_some());
    assert!(column_state.storyboard_prompt.is_some());

    let detached = h
        .client
        .detach_storyboard(&bid(), &column)
        .await
        .expect("detach");
    assert!(detached.prompt.is_none());
    assert!(detached.image_url.is_none());
    let column_state = detached.board.find_column(&column).expect("column");
    assert!(column_state.storyboard_image_url.is_none());
    assert!(column_state.storyboard_prompt.is_none());

    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::Confirmed);
    assert_eq!(entry.board, h.transport.server_board());
}

#[tokio::test]
async fn create_board_confirms_the_server_stamped_copy() {
    let transport = Arc::new(FakeTransport {
        board: Mutex::new(None),
        actor: parse_user_id("u1").expect("actor"),
        fail_next: AtomicBool::new(false),
        fetches: AtomicUsize::new(0),
        comment_seq: AtomicUsize::new(0),
    });
    let client = MutationClient::new(
        transport.clone(),
        Arc::new(RecordingNotifier::default()),
        parse_user_id("u1").expect("actor"),
        "Uli",
    );

    let draft = sample_board();
    let mut unstamped = draft.clone();
    unstamped.created_at = 0;
    unstamped.updated_at = 0;
    let created = client.create_board(&unstamped).await.expect("create");
    assert_eq!(created.created_at, SERVER_NOW);
    assert_eq!(created.updated_at, SERVER_NOW);

    let entry = client.cache().get(&draft.id).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::Confirmed);
}

#[tokio::test]
async fn submit_without_a_cached_entry_still_reaches_the_server() {
    let h = harness();
    // Cold cache: nothing to patch optimistically, the request goes out
    // anyway and the response seeds the cache.
    let board = h
        .client
        .submit(
            &bid(),
            BoardFragment::status(BoardStatus::InProgress),
            SubmitOptions::default(),
        )
        .await
        .expect("submit");
    assert_eq!(board.status, BoardStatus::InProgress);
    let entry = h.client.cache().get(&bid()).await.expect("entry");
    assert_eq!(entry.status, EntryStatus::Confirmed);
}
