use tracecook::config::load_catalogs;
use tracecook::cookers::{DataCookerDescriptor, DataCookerPath};
use tracecook::repository::{
    DataExtensionAvailability, DataExtensionLookup, DataExtensionRepository,
    DataExtensionRepositoryBuilder, SourceDataProcessor, TableSelection, enable_data_cookers,
    enable_source_data_cookers_for_tables, get_enabled_table_extension_references,
    sessions_for_repository,
};
use tracecook::scheduler::{Placement, SourceDataCookerScheduler};
use tracecook::test_utils::{
    BROKEN_TABLE, CPU_SAMPLES_TABLE, CPU_USAGE_TABLE, CatalogFixture, DISK_TABLE, SYSCALLS_TABLE,
    TestCatalogs, init_test_logging,
};

async fn load(fixtures: &[CatalogFixture]) -> DataExtensionRepository {
    init_test_logging(None);
    let catalogs = TestCatalogs::with(fixtures).unwrap();
    let builder = DataExtensionRepositoryBuilder::new();
    load_catalogs(catalogs.paths(), &builder).await.unwrap();
    builder.finalize_data_extensions()
}

fn path(text: &str) -> DataCookerPath {
    text.parse().unwrap()
}

fn pass_paths(scheduler: &SourceDataCookerScheduler) -> Vec<Vec<String>> {
    scheduler
        .data_cookers_by_source_pass()
        .iter()
        .map(|pass| pass.iter().map(|cooker| cooker.path().to_string()).collect())
        .collect()
}

#[tokio::test]
async fn test_all_tables_schedule_into_two_passes() {
    let repository = load(&[CatalogFixture::lttng(), CatalogFixture::etw()]).await;
    let mut sessions = sessions_for_repository(&repository);
    assert_eq!(
        sessions.iter().map(|s| s.source_parser_id().to_string()).collect::<Vec<_>>(),
        vec!["ETW", "LTTng"]
    );

    let tables = get_enabled_table_extension_references(&repository, &sessions, &TableSelection::All);
    let ids: Vec<_> = tables.iter().map(|table| table.descriptor().id).collect();
    assert_eq!(ids, vec![CPU_USAGE_TABLE, SYSCALLS_TABLE, CPU_SAMPLES_TABLE, DISK_TABLE]);

    let enabled = enable_source_data_cookers_for_tables(&repository, &mut sessions, &tables);
    assert_eq!(enabled.len(), 6);

    let lttng = sessions[1].build_schedule().unwrap();
    assert_eq!(
        pass_paths(&lttng),
        vec![
            vec!["LTTng/Threads", "LTTng/Stacks", "LTTng/Syscalls", "LTTng/CpuSamples"],
            vec!["LTTng/ContextSwitches"],
        ]
    );
    assert_eq!(lttng.placements(&path("LTTng/Syscalls")), &[Placement::new(0, 1)]);
    assert_eq!(lttng.placements(&path("LTTng/Stacks")), &[Placement::ORIGIN]);

    let etw = sessions[0].build_schedule().unwrap();
    assert_eq!(pass_paths(&etw), vec![vec!["ETW/DiskIo"]]);
}

#[tokio::test]
async fn test_tables_need_their_source_processor() {
    let repository = load(&[CatalogFixture::lttng(), CatalogFixture::etw()]).await;
    let sessions: Vec<_> = sessions_for_repository(&repository)
        .into_iter()
        .filter(|session| session.source_parser_id() == "ETW")
        .collect();

    let tables = get_enabled_table_extension_references(&repository, &sessions, &TableSelection::All);
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].descriptor().id, DISK_TABLE);
}

#[tokio::test]
async fn test_single_table_enables_only_what_it_needs() {
    let repository = load(&[CatalogFixture::lttng()]).await;
    let mut sessions = sessions_for_repository(&repository);

    let tables = get_enabled_table_extension_references(
        &repository,
        &sessions,
        &TableSelection::only([CPU_USAGE_TABLE]),
    );
    enable_source_data_cookers_for_tables(&repository, &mut sessions, &tables);

    let session = &sessions[0];
    assert!(session.is_data_cooker_enabled(&path("LTTng/ContextSwitches")));
    assert!(!session.is_data_cooker_enabled(&path("LTTng/Syscalls")));
    assert!(!session.is_data_cooker_enabled(&path("LTTng/Stacks")));

    let scheduler = session.build_schedule().unwrap();
    assert_eq!(pass_paths(&scheduler), vec![vec!["LTTng/Threads"], vec!["LTTng/ContextSwitches"]]);
}

#[tokio::test]
async fn test_broken_extensions_are_isolated() {
    let repository = load(&[CatalogFixture::lttng(), CatalogFixture::broken()]).await;

    let broken = repository.get_source_data_cooker(&path("LTTng/Broken")).unwrap();
    assert_eq!(broken.availability(), DataExtensionAvailability::Error);
    assert!(broken.errors()[0].contains("LTTng/Missing"));

    let table = repository.get_table(&BROKEN_TABLE).unwrap();
    assert_eq!(table.availability(), DataExtensionAvailability::Error);

    // Everything else in the same source stays usable
    assert_eq!(repository.error_count(), 2);
    let mut sessions = sessions_for_repository(&repository);
    let tables = get_enabled_table_extension_references(&repository, &sessions, &TableSelection::All);
    assert_eq!(tables.len(), 3);

    let enabled = enable_data_cookers(&repository, &mut sessions, &[path("LTTng/Broken")]);
    assert!(enabled.is_empty());
}

#[tokio::test]
async fn test_cycles_are_reported_by_the_repository() {
    let repository = load(&[CatalogFixture::cyclic()]).await;
    for id in ["S/A", "S/B"] {
        let reference = repository.get_source_data_cooker(&path(id)).unwrap();
        assert!(!reference.is_available());
        assert!(reference.errors()[0].starts_with("Circular dependency"));
    }
}

#[tokio::test]
async fn test_duplicate_catalogs_register_once() {
    init_test_logging(None);
    let catalogs = TestCatalogs::with(&[CatalogFixture::etw()]).unwrap();
    let mut paths = catalogs.paths().to_vec();
    paths.push(paths[0].clone());

    let builder = DataExtensionRepositoryBuilder::new();
    let summary = load_catalogs(&paths, &builder).await.unwrap();
    assert_eq!(summary.registered, 2);
    assert_eq!(summary.rejected, 2);
}

#[tokio::test]
async fn test_invalid_catalog_fails_to_load() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::invalid_syntax()]).unwrap();
    let builder = DataExtensionRepositoryBuilder::new();
    let error = load_catalogs(catalogs.paths(), &builder).await.unwrap_err();
    assert!(error.to_string().contains("Invalid extension catalog"));
}

#[test]
fn test_composite_descriptor_is_not_a_source_cooker() {
    let composite = tracecook::cookers::DataCookerSpec::composite("CpuUsage");
    assert!(composite.path().is_composite_data_cooker());
}
