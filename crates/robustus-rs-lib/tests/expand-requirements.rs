use robustus_rs::expander::{self, Expander};
use robustus_rs::fetcher::FetchError;
use robustus_rs::RequirementError;
use robustus_rs_test_utils::{frozen, write_manifest, FakeFetcher};

fn init() {
	let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn dependencies_come_first() {
	init();
	let fetcher = FakeFetcher::default()
		.with_manifest("https://host/a", Some("master"), &["-e git+https://host/b@master#egg=b"])
		.with_manifest("https://host/b", Some("master"), &["-e git+https://host/c@master#egg=c", "numpy==1.7.2"])
		.with_manifest("https://host/c", Some("master"), &["# tests", "pytest==2"]);

	let plan = Expander::new(&fetcher).expand(["-e git+https://host/a@master#egg=a"]).unwrap();
	assert_eq!(frozen(&plan), vec![
		"pytest==2",
		"-e git+https://host/c@master#egg=c",
		"numpy==1.7.2",
		"-e git+https://host/b@master#egg=b",
		"-e git+https://host/a@master#egg=a",
	]);
}

#[test]
fn shared_dependency_is_fetched_once() {
	init();
	let fetcher = FakeFetcher::default()
		.with_manifest("https://host/a", None, &["-e git+https://host/b#egg=b", "-e git+https://host/c#egg=c"])
		.with_manifest("https://host/b", None, &["-e git+https://host/d#egg=d"])
		.with_manifest("https://host/c", None, &["-e git+https://host/d#egg=d"])
		.with_manifest("https://host/d", None, &["six"]);

	let plan = Expander::new(&fetcher).expand(["-e git+https://host/a#egg=a"]).unwrap();
	assert_eq!(frozen(&plan), vec![
		"six",
		"-e git+https://host/d#egg=d",
		"-e git+https://host/b#egg=b",
		"-e git+https://host/c#egg=c",
		"-e git+https://host/a#egg=a",
	]);
	assert_eq!(fetcher.fetch_count("https://host/d"), 1);
}

#[test]
fn cycles_terminate() {
	init();
	let fetcher = FakeFetcher::default()
		.with_manifest("https://host/a", None, &["-e git+https://host/b#egg=b"])
		.with_manifest("https://host/b", None, &["-e git+https://host/a#egg=a"]);

	let plan = Expander::new(&fetcher).expand(["-e git+https://host/a#egg=a"]).unwrap();
	assert_eq!(frozen(&plan), vec!["-e git+https://host/b#egg=b", "-e git+https://host/a#egg=a"]);
	assert_eq!(fetcher.fetch_count("https://host/a"), 1);
	assert_eq!(fetcher.fetch_count("https://host/b"), 1);
}

#[test]
fn leaves_are_not_fetched() {
	init();
	let fetcher = FakeFetcher::default();
	let plan = Expander::new(&fetcher)
		.expand(["numpy==1.7.2", "git+https://host/a@master#egg=a", "-e http://host/other.tar.gz#egg=other"])
		.unwrap();
	assert_eq!(plan.len(), 3);
	assert!(fetcher.calls().is_empty());
}

#[test]
fn later_lines_win() {
	init();
	let fetcher = FakeFetcher::default();
	let plan = Expander::new(&fetcher).expand(["numpy==1.7.2", "pytest==2", "numpy==1.7.2", "numpy==1.7.3"]).unwrap();
	assert_eq!(frozen(&plan), vec!["numpy==1.7.3", "pytest==2"]);
}

#[test]
fn missing_revision_falls_back_when_ignored() {
	init();
	let fetcher = FakeFetcher::default().with_manifest("https://host/a", None, &["six"]);

	let plan = Expander::new(&fetcher)
		.ignore_missing_refs(true)
		.expand(["-e git+https://host/a@feature#egg=a"])
		.unwrap();
	assert_eq!(frozen(&plan), vec!["six", "-e git+https://host/a@feature#egg=a"]);
}

#[test]
fn missing_revision_is_fatal() {
	init();
	let fetcher = FakeFetcher::default().with_manifest("https://host/a", None, &["six"]);

	let result = Expander::new(&fetcher).expand(["-e git+https://host/a@feature#egg=a"]);
	assert!(matches!(
		result,
		Err(RequirementError::Fetch(FetchError::RevisionNotFound { ref revision, .. })) if revision == "feature"
	));
}

#[test]
fn tag_overrides_every_branch() {
	init();
	let fetcher = FakeFetcher::default()
		.with_manifest("https://host/a", Some("v2"), &["-e git+https://host/b@master#egg=b"])
		.with_manifest("https://host/b", Some("v2"), &["numpy"]);

	let plan = Expander::new(&fetcher)
		.tag(Some("v2".to_string()))
		.expand(["-e git+https://host/a@master#egg=a"])
		.unwrap();
	assert_eq!(frozen(&plan), vec!["numpy", "-e git+https://host/b@v2#egg=b", "-e git+https://host/a@v2#egg=a"]);
	assert_eq!(fetcher.calls(), vec![
		("https://host/a".to_string(), Some("v2".to_string())),
		("https://host/b".to_string(), Some("v2".to_string())),
	]);
}

#[test]
fn checkout_without_manifest() {
	init();
	let fetcher = FakeFetcher::default().with_checkout("https://host/a", Some("master"));
	let result = Expander::new(&fetcher).expand(["-e git+https://host/a@master#egg=a"]);
	assert!(matches!(result, Err(RequirementError::MissingManifest(ref pinned)) if pinned == "-e git+https://host/a@master#egg=a"));
}

#[test]
fn nested_parse_errors_name_their_manifest() {
	init();
	let fetcher = FakeFetcher::default().with_manifest("https://host/a", Some("master"), &["six", "numpy=="]);

	match Expander::new(&fetcher).expand(["-e git+https://host/a@master#egg=a"]) {
		Err(RequirementError::InManifest { manifest, source }) => {
			assert_eq!(manifest, "-e git+https://host/a@master#egg=a");
			assert!(matches!(*source, RequirementError::InvalidSpecifier(ref literal) if literal == "numpy=="));
		},
		other => panic!("unexpected result {:?}", other),
	}
}

#[test]
fn local_checkouts_are_expanded() {
	init();
	let dir = tempfile::tempdir().unwrap();
	let dep = dir.path().join("dep");
	let pkg = dir.path().join("pkg");
	write_manifest(&dep, &["six"]).unwrap();
	let dep_line = format!("-e {}", dep.display());
	write_manifest(&pkg, &["numpy==1.7.2", dep_line.as_str()]).unwrap();

	let fetcher = FakeFetcher::default();
	let plan = Expander::new(&fetcher).expand([format!("-e {}", pkg.display())]).unwrap();
	assert_eq!(frozen(&plan), vec![
		"numpy==1.7.2".to_string(),
		"six".to_string(),
		dep_line,
		format!("-e {}", pkg.display()),
	]);
	assert!(fetcher.calls().is_empty());
}

#[test]
fn local_checkout_without_manifest() {
	init();
	let dir = tempfile::tempdir().unwrap();
	let line = format!("-e {}", dir.path().display());
	let result = Expander::new(&FakeFetcher::default()).expand([&line]);
	assert!(matches!(result, Err(RequirementError::MissingManifest(ref pinned)) if *pinned == line));
}

#[test]
fn requirement_files() {
	init();
	let dir = tempfile::tempdir().unwrap();
	let file = write_manifest(dir.path(), &[
		"# pinned for the release",
		"numpy==1.7.3",
		"-e \\",
		"  git+https://host/a@master#egg=a",
		"",
		"pytest",
	]).unwrap();
	let fetcher = FakeFetcher::default().with_manifest("https://host/a", Some("master"), &["six"]);

	let plan = expander::read_requirement_file(&file, None, false, &fetcher).unwrap();
	assert_eq!(frozen(&plan), vec!["numpy==1.7.3", "six", "-e git+https://host/a@master#egg=a", "pytest"]);

	let plan = Expander::new(&fetcher).expand_all(&["numpy==1.7.2".to_string(), "scipy".to_string()], &[file]).unwrap();
	assert_eq!(frozen(&plan), vec!["numpy==1.7.3", "scipy", "six", "-e git+https://host/a@master#egg=a", "pytest"]);
}

#[test]
fn missing_requirement_file() {
	init();
	let dir = tempfile::tempdir().unwrap();
	let result = Expander::new(&FakeFetcher::default()).expand_file(dir.path().join("missing.txt"));
	assert!(matches!(result, Err(RequirementError::Read { .. })));
}

#[test]
fn nothing_to_install() {
	init();
	let result = Expander::new(&FakeFetcher::default()).expand_all(&[], &[]);
	assert!(matches!(result, Err(robustus_rs::Error::NoRequirements)));
}

#[test]
fn multi_instance_packages_are_not_merged() {
	init();
	let fetcher = FakeFetcher::default();
	let plan = Expander::new(&fetcher)
		.duplicate_policy(robustus_rs::Config::default().duplicate_policy())
		.expand(["ros_overlay==indigo", "numpy", "ros_overlay==hydro", "numpy==1.7.2"])
		.unwrap();
	assert_eq!(frozen(&plan), vec!["ros_overlay==indigo", "numpy==1.7.2", "ros_overlay==hydro"]);
}
