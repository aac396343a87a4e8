use crate::{error::FormError, model::GroupKey};
use hashbrown::HashMap;
use tracing::{error, trace, warn};

/// Where a group's DOM subtree is in its life.
///
/// `Absent → Rendering → Interactive → Removing → Absent`. A group only accepts mutations while [`Interactive`](`GroupState::Interactive`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
	Absent,
	Rendering,
	Interactive,
	Removing,
}

impl GroupState {
	#[must_use]
	pub fn can_become(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Absent, Self::Rendering) | (Self::Rendering, Self::Interactive) | (Self::Interactive, Self::Removing) | (Self::Removing, Self::Absent)
		)
	}
}

/// Tracks [`GroupState`] per group key. Keys that aren't tracked are [`Absent`](`GroupState::Absent`).
#[derive(Debug, Default)]
pub struct Lifecycles(HashMap<GroupKey, GroupState>);

impl Lifecycles {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn state(&self, key: &GroupKey) -> GroupState {
		self.0.get(key).copied().unwrap_or(GroupState::Absent)
	}

	/// Moves `key` to `next`.
	///
	/// # Errors
	///
	/// [`FormError::NotInteractive`] if the transition skips a state. The tracked state is left unchanged.
	pub fn advance(&mut self, key: &GroupKey, next: GroupState) -> Result<(), FormError> {
		let current = self.state(key);
		if !current.can_become(next) {
			error!("Rejected group transition {:?} -> {:?} for {}", current, next, key);
			return Err(FormError::NotInteractive { key: key.clone(), state: current });
		}
		trace!("Group {}: {:?} -> {:?}", key, current, next);
		if next == GroupState::Absent {
			self.0.remove(key);
		} else {
			self.0.insert(key.clone(), next);
		}
		Ok(())
	}

	/// Forgets a group whose rendering failed halfway, without passing through [`Interactive`](`GroupState::Interactive`).
	pub fn abort(&mut self, key: &GroupKey) {
		if let Some(state) = self.0.remove(key) {
			warn!("Aborted group {} while {:?}", key, state);
		}
	}

	/// Succeeds only for groups that currently accept mutations.
	pub fn require_interactive(&self, key: &GroupKey) -> Result<(), FormError> {
		match self.state(key) {
			GroupState::Interactive => Ok(()),
			state => Err(FormError::NotInteractive { key: key.clone(), state }),
		}
	}
}
