use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    imports: AtomicU64,
    imported_records: AtomicU64,
    import_failures: AtomicU64,
    migrations: AtomicU64,
    migration_category_failures: AtomicU64,
}

impl Metrics {
    pub fn record_import(&self, added: usize) {
        self.imports.fetch_add(1, Ordering::Relaxed);
        self.imported_records
            .fetch_add(added as u64, Ordering::Relaxed);
    }

    pub fn record_import_failure(&self) {
        self.import_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_migration(&self, failed_categories: usize) {
        self.migrations.fetch_add(1, Ordering::Relaxed);
        self.migration_category_failures
            .fetch_add(failed_categories as u64, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let imports = self.imports.load(Ordering::Relaxed);
        let records = self.imported_records.load(Ordering::Relaxed);
        let failures = self.import_failures.load(Ordering::Relaxed);
        let migrations = self.migrations.load(Ordering::Relaxed);
        let migration_failures = self.migration_category_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE gacha_imports_total counter\n\
gacha_imports_total {}\n\
# TYPE gacha_imported_records_total counter\n\
gacha_imported_records_total {}\n\
# TYPE gacha_import_failures_total counter\n\
gacha_import_failures_total {}\n\
# TYPE gacha_migrations_total counter\n\
gacha_migrations_total {}\n\
# TYPE gacha_migration_category_failures_total counter\n\
gacha_migration_category_failures_total {}\n",
            imports, records, failures, migrations, migration_failures
        )
    }
}
