// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Property-based convergence tests.
//!
//! Several replicas edit a shared document through snapshot merges, swap ops
//! now and then, and finally swap everything. Whatever the edits and however
//! the ops are interleaved, every replica must end up with the same text.

use proptest::prelude::*;

use concord::crdt::id::ACTOR_ID_LEN;
use concord::ActorId;
use concord::ApplyError;
use concord::Crdt;
use concord::Document;
use concord::TextOp;

// =============================================================================
// Test helpers
// =============================================================================

const REPLICAS: usize = 3;

fn actor(byte: u8) -> ActorId {
    return ActorId([byte; ACTOR_ID_LEN]);
}

/// A random edit to a replica's current text.
#[derive(Clone, Debug)]
enum Edit {
    Insert { pos_pct: f64, content: String },
    Delete { pos_pct: f64, len_pct: f64 },
    Replace { content: String },
}

/// One step of a simulated session.
#[derive(Clone, Debug)]
enum Step {
    Edit { replica: usize, edit: Edit },
    Sync { from: usize, to: usize },
}

fn arbitrary_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0.0..=1.0f64, "[a-e]{1,4}")
            .prop_map(|(pos_pct, content)| Edit::Insert { pos_pct, content }),
        2 => (0.0..=1.0f64, 0.0..=0.5f64)
            .prop_map(|(pos_pct, len_pct)| Edit::Delete { pos_pct, len_pct }),
        1 => "[a-e]{0,6}".prop_map(|content| Edit::Replace { content }),
    ]
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..REPLICAS, arbitrary_edit())
            .prop_map(|(replica, edit)| Step::Edit { replica, edit }),
        1 => (0..REPLICAS, 0..REPLICAS)
            .prop_map(|(from, to)| Step::Sync { from, to }),
    ]
}

/// Apply an edit to plain text.
fn edit_text(text: &str, edit: &Edit) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    match edit {
        Edit::Insert { pos_pct, content } => {
            let pos = ((*pos_pct * len as f64) as usize).min(len);
            chars.splice(pos..pos, content.chars());
        }
        Edit::Delete { pos_pct, len_pct } => {
            if len > 0 {
                let start = ((*pos_pct * len as f64) as usize).min(len - 1);
                let count = ((*len_pct * (len - start) as f64) as usize).max(1);
                chars.drain(start..(start + count).min(len));
            }
        }
        Edit::Replace { content } => return content.clone(),
    }
    return chars.into_iter().collect();
}

/// A replica with a buffer for ops whose dependencies have not arrived.
struct Peer {
    doc: Document,
    pending: Vec<TextOp>,
    /// How much of each replica's log this peer has received.
    received: [usize; REPLICAS],
}

impl Peer {
    fn new(index: usize) -> Peer {
        return Peer {
            doc: Document::new(actor(index as u8 + 1)),
            pending: Vec::new(),
            received: [0; REPLICAS],
        };
    }

    /// Apply what can be applied, retrying until nothing changes.
    /// A delete that lands on a tombstone already did its job.
    fn drain(&mut self) {
        loop {
            let before = self.pending.len();
            let doc = &mut self.doc;
            self.pending.retain(|op| match doc.apply_op(op) {
                Ok(()) => false,
                Err(ApplyError::Delete(err)) if err.is_benign() => false,
                Err(_) => true,
            });
            if self.pending.len() == before {
                break;
            }
        }
    }
}

/// Hand `to` every op `from` generated that it has not seen yet.
fn sync(peers: &mut [Peer], logs: &[Vec<TextOp>], from: usize, to: usize) {
    if from == to {
        return;
    }
    let start = peers[to].received[from];
    peers[to].pending.extend(logs[from][start..].iter().cloned());
    peers[to].received[from] = logs[from].len();
    peers[to].drain();
}

/// Run a session and return the peers and every replica's op log.
fn run(steps: &[Step]) -> (Vec<Peer>, Vec<Vec<TextOp>>) {
    let mut peers: Vec<Peer> = (0..REPLICAS).map(Peer::new).collect();
    let mut logs: Vec<Vec<TextOp>> = vec![Vec::new(); REPLICAS];

    for step in steps {
        match step {
            Step::Edit { replica, edit } => {
                let peer = &mut peers[*replica];
                let text = edit_text(&peer.doc.visible_text(), edit);
                let ops = peer.doc.merge(&text);
                assert_eq!(peer.doc.visible_text(), text);
                logs[*replica].extend(ops);
            }
            Step::Sync { from, to } => sync(&mut peers, &logs, *from, *to),
        }
    }
    return (peers, logs);
}

/// Deliver every log to a fresh document, interleaving actors as `choices`
/// says while keeping each actor's own order.
fn replay_interleaved(logs: &[Vec<TextOp>], choices: &[usize]) -> Document {
    let mut observer = Peer::new(REPLICAS + 1);
    let mut cursors = vec![0usize; logs.len()];
    let mut choice = choices.iter().cycle();

    loop {
        let live: Vec<usize> = (0..logs.len()).filter(|&i| cursors[i] < logs[i].len()).collect();
        if live.is_empty() {
            break;
        }
        let pick = live[choice.next().copied().unwrap_or(0) % live.len()];
        observer.pending.push(logs[pick][cursors[pick]].clone());
        cursors[pick] += 1;
        observer.drain();
    }

    assert!(observer.pending.is_empty(), "ops never applied: {:?}", observer.pending);
    return observer.doc;
}

// =============================================================================
// Fixed cases
// =============================================================================

fn replace(replica: usize, content: &str) -> Step {
    return Step::Edit { replica, edit: Edit::Replace { content: content.to_string() } };
}

/// One replica replaces text it typed while two others type into empty
/// documents. Smallest session where the replacement's anchors matter.
fn replacement_session() -> Vec<Step> {
    return vec![replace(1, "ce"), replace(1, "ae"), replace(0, "a"), replace(2, "a")];
}

#[test]
fn replacement_converges_after_full_sync() {
    let (mut peers, logs) = run(&replacement_session());
    for from in 0..REPLICAS {
        for to in 0..REPLICAS {
            sync(&mut peers, &logs, from, to);
        }
    }

    for peer in &peers {
        assert!(peer.pending.is_empty());
        assert_eq!(peer.doc.visible_text(), "aaea");
    }
}

#[test]
fn replacement_converges_in_any_interleaving() {
    let (_, logs) = run(&replacement_session());
    for choices in [vec![0], vec![1], vec![2], vec![0, 2, 1], vec![2, 1, 1, 0], vec![1, 0, 0, 2, 1]] {
        let doc = replay_interleaved(&logs, &choices);
        assert_eq!(doc.visible_text(), "aaea", "choices {:?}", choices);
    }
}

#[test]
fn replacement_state_merge_commutes() {
    let (peers, _) = run(&replacement_session());

    let mut left = peers[0].doc.clone();
    Crdt::merge(&mut left, &peers[1].doc);
    Crdt::merge(&mut left, &peers[2].doc);

    let mut right = peers[2].doc.clone();
    Crdt::merge(&mut right, &peers[1].doc);
    Crdt::merge(&mut right, &peers[0].doc);

    assert_eq!(left.visible_text(), "aaea");
    assert_eq!(right.visible_text(), "aaea");
}

// =============================================================================
// Convergence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replicas_converge(steps in prop::collection::vec(arbitrary_step(), 1..40)) {
        let (mut peers, logs) = run(&steps);

        for _ in 0..2 {
            for from in 0..REPLICAS {
                for to in 0..REPLICAS {
                    sync(&mut peers, &logs, from, to);
                }
            }
        }

        let expected = peers[0].doc.visible_text();
        for peer in &peers {
            prop_assert!(peer.pending.is_empty());
            prop_assert_eq!(peer.doc.visible_text(), expected.clone());
            prop_assert!(peer.doc.sequence().verify_invariants());
        }
    }

    #[test]
    fn delivery_order_does_not_matter(
        steps in prop::collection::vec(arbitrary_step(), 1..30),
        first in prop::collection::vec(0usize..8, 1..20),
        second in prop::collection::vec(0usize..8, 1..20),
    ) {
        let (_, logs) = run(&steps);

        let a = replay_interleaved(&logs, &first);
        let b = replay_interleaved(&logs, &second);
        prop_assert_eq!(a.visible_text(), b.visible_text());
    }

    #[test]
    fn state_merge_commutes(steps in prop::collection::vec(arbitrary_step(), 1..30)) {
        let (peers, _) = run(&steps);

        let mut left = peers[0].doc.clone();
        Crdt::merge(&mut left, &peers[1].doc);
        Crdt::merge(&mut left, &peers[2].doc);

        let mut right = peers[2].doc.clone();
        Crdt::merge(&mut right, &peers[1].doc);
        Crdt::merge(&mut right, &peers[0].doc);

        prop_assert_eq!(left.visible_text(), right.visible_text());
        prop_assert!(left.sequence().verify_invariants());

        // Merging again changes nothing
        let entries = left.sequence().entry_count();
        let text = left.visible_text();
        let snapshot = left.clone();
        Crdt::merge(&mut left, &snapshot);
        Crdt::merge(&mut left, &peers[1].doc);
        prop_assert_eq!(left.sequence().entry_count(), entries);
        prop_assert_eq!(left.visible_text(), text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn merge_own_text_is_empty(texts in prop::collection::vec("[a-c]{0,8}", 1..6)) {
        let mut doc = Document::new(actor(1));
        for text in &texts {
            doc.merge(text);
            let current = doc.visible_text();
            prop_assert!(doc.merge(&current).is_empty());
        }
    }

    #[test]
    fn merge_reaches_target(
        texts in prop::collection::vec("[a-c ]{0,10}", 1..8),
        target in "[a-c ]{0,10}",
    ) {
        let mut doc = Document::new(actor(1));
        for text in &texts {
            doc.merge(text);
        }

        let mut copy = doc.clone();
        let ops = doc.merge(&target);
        prop_assert_eq!(doc.visible_text(), target.clone());
        prop_assert!(copy.apply_all(&ops));
        prop_assert_eq!(copy.visible_text(), target);

        // Deletes first, then inserts
        let first_insert = ops.iter().position(|op| op.is_insert()).unwrap_or(ops.len());
        prop_assert!(ops[first_insert..].iter().all(|op| op.is_insert()));
    }
}
