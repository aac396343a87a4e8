use kata_form_dom::{
	pager::{Dot, TabPager},
	toggle::{self, AccessType, AccessVisibility, LanguageToggle},
};

#[test]
fn access_sections() {
	for (id, access) in [
		("access_application", AccessType::AccessApplication),
		("direct_download", AccessType::DirectDownload),
		("access_request", AccessType::AccessRequest),
		("contact_owner", AccessType::ContactOwner),
	] {
		assert_eq!(id.parse::<AccessType>().unwrap(), access);
		assert_eq!(access.id(), id);

		let shown: Vec<&str> = toggle::access_visibility(access).sections().iter().filter(|(_, visible)| *visible).map(|(section, _)| *section).collect();
		match access {
			AccessType::ContactOwner => assert!(shown.is_empty()),
			_ => assert_eq!(shown, vec![format!("urlDiv_{id}")]),
		}
	}
	assert!("open".parse::<AccessType>().is_err());
	assert_eq!(toggle::access_visibility(AccessType::ContactOwner), AccessVisibility::default());
}

#[test]
fn language_section() {
	assert_eq!(
		toggle::toggle_language(false, false),
		LanguageToggle {
			visible: true,
			warn_data_loss: false,
		}
	);
	assert_eq!(
		toggle::toggle_language(true, true),
		LanguageToggle {
			visible: false,
			warn_data_loss: true,
		}
	);
	assert!(!toggle::toggle_language(false, true).warn_data_loss);
	assert!(!toggle::toggle_language(true, false).warn_data_loss);
}

#[test]
fn pager() {
	let mut pager = TabPager::new(3);
	assert!(!pager.can_prev());
	assert_eq!(pager.prev(), None);
	assert_eq!(pager.indicator(), vec![Dot::Filled, Dot::Empty, Dot::Empty]);

	assert_eq!(pager.next(), Some(1));
	assert_eq!(pager.next(), Some(2));
	assert_eq!(pager.next(), None);
	assert_eq!(pager.indicator(), vec![Dot::Empty, Dot::Empty, Dot::Filled]);

	assert!(!pager.select(3));
	assert!(pager.select(0));
	assert_eq!(pager.active(), 0);
	assert_eq!(pager.count(), 3);

	let empty = TabPager::new(0);
	assert!(!empty.can_next());
	assert!(empty.indicator().is_empty());
}
