use std::sync::Arc;

use mongodb::{bson::doc, Client, Database};
use tracing::info;

use crate::{
    config::{AppConfig, StorageKind},
    models::{
        catalog::CatalogEntry, personnel::Personnel, project::Project, report::Report,
        report_modification::ReportModification, user::User, vehicle::Vehicle,
    },
    store::{Entity, MemoryRepository, MongoRepository, Repository, StoreError},
};

/// Every collection the server touches, behind the repository port.
#[derive(Clone)]
pub struct Collections {
    pub reports: Arc<dyn Repository<Report>>,
    pub modifications: Arc<dyn Repository<ReportModification>>,
    pub vehicles: Arc<dyn Repository<Vehicle>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub personnel: Arc<dyn Repository<Personnel>>,
    pub catalogs: Arc<dyn Repository<CatalogEntry>>,
    pub users: Arc<dyn Repository<User>>,
}

fn mongo<T: Entity>(db: &Database) -> Arc<dyn Repository<T>> {
    Arc::new(MongoRepository::<T>::new(db))
}

fn memory<T: Entity>() -> Arc<dyn Repository<T>> {
    Arc::new(MemoryRepository::<T>::new())
}

impl Collections {
    pub async fn open(config: &AppConfig) -> Result<Self, StoreError> {
        match config.storage {
            StorageKind::Mongo => Self::connect(&config.mongodb_uri, &config.mongodb_database).await,
            StorageKind::Memory => {
                info!("using in-memory storage, data is lost on shutdown");
                Ok(Self::in_memory())
            }
        }
    }
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }, None).await?;
        info!(database, "connected to MongoDB");

        Ok(Self {
            reports: mongo(&db),
            modifications: mongo(&db),
            vehicles: mongo(&db),
            projects: mongo(&db),
            personnel: mongo(&db),
            catalogs: mongo(&db),
            users: mongo(&db),
        })
    }
    pub fn in_memory() -> Self {
        Self {
            reports: memory(),
            modifications: memory(),
            vehicles: memory(),
            projects: memory(),
            personnel: memory(),
            catalogs: memory(),
            users: memory(),
        }
    }
}
