//! DecisionLedger — deterministic decision ledger kernel.
//!
//! A content-addressed, hash-chained record store (`cell`, `chain`) backed
//! by a crash-safe segmented write-ahead log (`wal`), a typed per-domain
//! precedent engine (`domain`, `precedent`, `judgment`), and a
//! non-contaminating shadow/simulation layer (`shadow`) for running a
//! decision or a policy change against a forked view of history without
//! ever mutating it.
//!
//! INVARIANTS:
//! 1. `BTreeMap`/`BTreeSet` everywhere a chain, WAL, or precedent result is
//!    iterated — iteration order must be deterministic across runs.
//! 2. Every on-chain hash is RFC 8785 canonical-JSON-then-SHA-256; floats
//!    never enter a canonical payload (`canon::Value` has no float variant).
//! 3. `Chain` and `wal::segment` are the only modules that touch real time
//!    or the filesystem; `precedent` and `shadow` are pure functions of the
//!    chain state handed to them.
//! 4. A shadow-chain simulation must never mutate the base chain it forks
//!    from — enforced both by `&Chain` in `shadow::simulate_rfa`'s
//!    signature and by an explicit before/after head check inside it.

pub mod calendar;
pub mod canon;
pub mod cell;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod evidence;
pub mod judgment;
pub mod pack;
pub mod precedent;
pub mod shadow;
pub mod wal;
pub mod witness;

pub use cell::Cell;
pub use chain::Chain;
pub use error::{ErrorKind, LedgerError, Result};
