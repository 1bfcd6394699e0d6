// SPDX-License-Identifier: Apache-2.0

use crate::clock::Clock;
use crate::error::MergeError;
use waypoint_model::{
    validate_board, Block, BlockId, Board, BoardFragment, ColumnId, Comment, CommentId, UserId,
};

/// Applies one fragment to a stored Board.
///
/// Field-level replace only: each field present in the fragment overwrites
/// the stored field wholesale, absent fields are untouched. Concurrent
/// patches to the same field are resolved last-write-wins by whichever
/// update commits later; this is documented policy, and no conflict error
/// exists. The merged candidate is validated before being returned, so a
/// patch introducing a dangling `columnId` or a half-set storyboard pair
/// never becomes canonical.
pub fn apply_patch(
    stored: &Board,
    fragment: &BoardFragment,
    actor: &UserId,
    clock: &dyn Clock,
) -> Result<Board, MergeError> {
    if let Some(id) = &fragment.id {
        if *id != stored.id {
            return Err(MergeError::BoardIdMismatch {
                expected: stored.id.clone(),
                got: id.clone(),
            });
        }
    }
    if !stored.can_mutate(actor) {
        return Err(MergeError::Forbidden {
            actor: actor.clone(),
        });
    }
    let now = clock.now_millis();
    let mut merged = fragment.apply_to(stored);
    // Comments introduced client-side arrive unstamped (createdAt 0); the
    // server clock is the only source of comment timestamps.
    for block in &mut merged.blocks {
        for comment in &mut block.comments {
            if comment.created_at == 0 {
                comment.created_at = now;
            }
        }
    }
    merged.updated_at = now;
    validate_board(&merged)?;
    Ok(merged)
}

/// Payload of a comment append. The id is server-assigned for the
/// sub-resource flow; the identity pair arrives pre-validated.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: CommentId,
    pub content: String,
    pub user_id: UserId,
    pub author_name: String,
}

/// Appends a comment to one Block's thread, expressed as a whole-`blocks`
/// replace so it goes through the same merge and validation path as any
/// other patch.
pub fn append_comment(
    stored: &Board,
    block_id: &BlockId,
    comment: NewComment,
    actor: &UserId,
    clock: &dyn Clock,
) -> Result<Board, MergeError> {
    if stored.find_block(block_id).is_none() {
        return Err(MergeError::UnknownBlock(block_id.clone()));
    }
    let blocks: Vec<Block> = stored
        .blocks
        .iter()
        .map(|b| {
            let mut next = b.clone();
            if next.id == *block_id {
                next.comments.push(Comment {
                    id: comment.id.clone(),
                    content: comment.content.clone(),
                    author_name: comment.author_name.clone(),
                    user_id: comment.user_id.clone(),
                    created_at: clock.now_millis(),
                });
            }
            next
        })
        .collect();
    apply_patch(stored, &BoardFragment::blocks(blocks), actor, clock)
}

/// Sets or clears one Column's storyboard pair. `Some((prompt, url))`
/// attaches, `None` detaches; the two fields always move together.
pub fn set_storyboard(
    stored: &Board,
    column_id: &ColumnId,
    storyboard: Option<(String, String)>,
    actor: &UserId,
    clock: &dyn Clock,
) -> Result<Board, MergeError> {
    if stored.find_column(column_id).is_none() {
        return Err(MergeError::UnknownColumn(column_id.clone()));
    }
    let phases = stored
        .phases
        .iter()
        .map(|p| {
            let mut next = p.clone();
            for column in &mut next.columns {
                if column.id == *column_id {
                    match &storyboard {
                        Some((prompt, url)) => {
                            column.storyboard_prompt = Some(prompt.clone());
                            column.storyboard_image_url = Some(url.clone());
                        }
                        None => {
                            column.storyboard_prompt = None;
                            column.storyboard_image_url = None;
                        }
                    }
                }
            }
            next
        })
        .collect();
    apply_patch(stored, &BoardFragment::phases(phases), actor, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use waypoint_model::{
        parse_block_id, parse_board_id, parse_column_id, parse_comment_id, parse_phase_id,
        parse_user_id, BoardStatus, Column, Phase,
    };

    fn board() -> Board {
        let mut board = Board::new(
            parse_board_id("B1").expect("board id"),
            "Trial journey",
            parse_user_id("u1").expect("owner"),
        );
        board.phases = vec![Phase {
            id: parse_phase_id("p1").expect("phase id"),
            name: "Sign up".to_string(),
            columns: vec![Column::new(parse_column_id("c1").expect("column id"), "Form")],
        }];
        board.blocks = vec![Block {
            id: parse_block_id("b1").expect("block id"),
            column_id: parse_column_id("c1").expect("column id"),
            content: "hello".to_string(),
            lane: String::new(),
            comments: Vec::new(),
        }];
        board
    }

    #[test]
    fn patch_from_non_member_is_forbidden() {
        let stored = board();
        let err = apply_patch(
            &stored,
            &BoardFragment::status(BoardStatus::Review),
            &parse_user_id("intruder").expect("user"),
            &FixedClock(10),
        )
        .expect_err("must be rejected");
        assert!(matches!(err, MergeError::Forbidden { .. }));
    }

    #[test]
    fn patch_stamps_updated_at_and_new_comment_timestamps() {
        let stored = board();
        let mut blocks = stored.blocks.clone();
        blocks[0].comments.push(Comment {
            id: parse_comment_id("cm1").expect("comment id"),
            content: "nice".to_string(),
            author_name: "Ann".to_string(),
            user_id: parse_user_id("u1").expect("user"),
            created_at: 0,
        });
        let merged = apply_patch(
            &stored,
            &BoardFragment::blocks(blocks),
            &parse_user_id("u1").expect("actor"),
            &FixedClock(42),
        )
        .expect("merge");
        assert_eq!(merged.updated_at, 42);
        assert_eq!(merged.blocks[0].comments[0].created_at, 42);
    }

    #[test]
    fn fragment_echoing_wrong_board_id_is_rejected() {
        let stored = board();
        let fragment = BoardFragment {
            id: Some(parse_board_id("B2").expect("id")),
            ..BoardFragment::status(BoardStatus::Complete)
        };
        let err = apply_patch(
            &stored,
            &fragment,
            &parse_user_id("u1").expect("actor"),
            &FixedClock(1),
        )
        .expect_err("mismatched id");
        assert!(matches!(err, MergeError::BoardIdMismatch { .. }));
    }

    #[test]
    fn any_status_transition_is_accepted() {
        let mut stored = board();
        stored.status = BoardStatus::Complete;
        let merged = apply_patch(
            &stored,
            &BoardFragment::status(BoardStatus::Draft),
            &parse_user_id("u1").expect("actor"),
            &FixedClock(1),
        )
        .expect("complete -> draft is legal");
        assert_eq!(merged.status, BoardStatus::Draft);
    }

    #[test]
    fn deleting_a_column_still_referenced_by_blocks_fails_validation() {
        let stored = board();
        let mut phases = stored.phases.clone();
        phases[0].columns.clear();
        let err = apply_patch(
            &stored,
            &BoardFragment::phases(phases),
            &parse_user_id("u1").expect("actor"),
            &FixedClock(1),
        )
        .expect_err("blocks still reference c1");
        assert!(matches!(err, MergeError::Validation(_)));
    }

    #[test]
    fn append_comment_targets_one_block_and_stamps_server_time() {
        let stored = board();
        let merged = append_comment(
            &stored,
            &parse_block_id("b1").expect("block"),
            NewComment {
                id: parse_comment_id("cm1").expect("comment id"),
                content: "nice".to_string(),
                user_id: parse_user_id("u2").expect("user"),
                author_name: "Ann".to_string(),
            },
            &parse_user_id("u1").expect("actor"),
            &FixedClock(77),
        )
        .expect("append");
        let thread = &merged.blocks[0].comments;
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].content, "nice");
        assert_eq!(thread[0].created_at, 77);
        // Other fields unchanged.
        assert_eq!(merged.name, stored.name);
        assert_eq!(merged.phases, stored.phases);
    }

    #[test]
    fn append_comment_to_unknown_block_fails() {
        let stored = board();
        let err = append_comment(
            &stored,
            &parse_block_id("b9").expect("block"),
            NewComment {
                id: parse_comment_id("cm1").expect("comment id"),
                content: "lost".to_string(),
                user_id: parse_user_id("u1").expect("user"),
                author_name: "Ann".to_string(),
            },
            &parse_user_id("u1").expect("actor"),
            &FixedClock(1),
        )
        .expect_err("unknown block");
        assert!(matches!(err, MergeError::UnknownBlock(_)));
    }

    #[test]
    fn storyboard_attach_and_detach_move_the_pair_together() {
        let stored = board();
        let column = parse_column_id("c1").expect("column");
        let actor = parse_user_id("u1").expect("actor");
        let attached = set_storyboard(
            &stored,
            &column,
            Some(("a sketch".to_string(), "https://img/1.png".to_string())),
            &actor,
            &FixedClock(5),
        )
        .expect("attach");
        let col = attached.find_column(&column).expect("column");
        assert_eq!(col.storyboard_prompt.as_deref(), Some("a sketch"));
        assert_eq!(col.storyboard_image_url.as_deref(), Some("https://img/1.png"));

        let detached =
            set_storyboard(&attached, &column, None, &actor, &FixedClock(6)).expect("detach");
        let col = detached.find_column(&column).expect("column");
        assert!(col.storyboard_prompt.is_none());
        assert!(col.storyboard_image_url.is_none());
    }

    #[test]
    fn storyboard_on_unknown_column_fails() {
        let stored = board();
        let err = set_storyboard(
            &stored,
            &parse_column_id("c9").expect("column"),
            None,
            &parse_user_id("u1").expect("actor"),
            &FixedClock(1),
        )
        .expect_err("unknown column");
        assert!(matches!(err, MergeError::UnknownColumn(_)));
    }
}
