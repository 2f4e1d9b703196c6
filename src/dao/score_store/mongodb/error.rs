use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The initial connection ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver error of the last attempt.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a collection failed.
    #[error("failed to list documents in collection `{collection}`")]
    ListEntities {
        /// Collection being listed.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A point lookup by id failed.
    #[error("failed to load document `{id}` from collection `{collection}`")]
    FindEntity {
        /// Collection being queried.
        collection: &'static str,
        /// Document identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Locating or creating the score for a (team, round) pair failed.
    #[error("failed to find or create score for team `{team_id}` round `{round_id}`")]
    FindOrCreateScore {
        /// Team side of the pair.
        team_id: Uuid,
        /// Round side of the pair.
        round_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing a new point entry failed.
    #[error("failed to insert point `{id}`")]
    InsertPoint {
        /// Point identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Updating a point entry failed.
    #[error("failed to update point `{id}`")]
    UpdatePoint {
        /// Point identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Removing a point entry failed.
    #[error("failed to delete point `{id}`")]
    DeletePoint {
        /// Point identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Applying a hidden flag to a team failed.
    #[error("failed to update visibility of team `{id}`")]
    SetVisibility {
        /// Team identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Seeding rounds/teams at startup failed.
    #[error("failed to seed collection `{collection}`")]
    SeedEntities {
        /// Collection being seeded.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
