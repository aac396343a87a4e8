//! Previous/next navigation across the tabs of the dataset form, with a dot progress indicator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dot {
	Empty,
	Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabPager {
	count: usize,
	active: usize,
}

impl TabPager {
	/// Starts on the first tab.
	#[must_use]
	pub fn new(count: usize) -> Self {
		Self { count, active: 0 }
	}

	#[must_use]
	pub fn active(&self) -> usize {
		self.active
	}

	#[must_use]
	pub fn count(&self) -> usize {
		self.count
	}

	/// Records that tab `index` was shown. Out of range indices are ignored and return `false`.
	pub fn select(&mut self, index: usize) -> bool {
		if index < self.count {
			self.active = index;
			true
		} else {
			false
		}
	}

	pub fn next(&mut self) -> Option<usize> {
		self.can_next().then(|| {
			self.active += 1;
			self.active
		})
	}

	pub fn prev(&mut self) -> Option<usize> {
		self.can_prev().then(|| {
			self.active -= 1;
			self.active
		})
	}

	#[must_use]
	pub fn can_prev(&self) -> bool {
		self.active > 0
	}

	#[must_use]
	pub fn can_next(&self) -> bool {
		self.active + 1 < self.count
	}

	/// One dot per tab, filled for the active one.
	#[must_use]
	pub fn indicator(&self) -> Vec<Dot> {
		(0..self.count).map(|i| if i == self.active { Dot::Filled } else { Dot::Empty }).collect()
	}
}
