use std::{process, sync::Arc};

use brusio::{
    application::{
        comments::CommentService,
        error::AppError,
        feed::FeedService,
        posts::PostService,
        relationships::RelationshipService,
        repos::{
            CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, StoreHealth,
            UsersRepo,
        },
    },
    cache::{CacheConfig, CacheState, FeedCache, SystemClock},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{AdminState, HttpState, build_admin_router, build_public_router},
        memory::MemoryRepositories,
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

/// Repository handles shared by the services; both storage backends
/// implement the same traits.
struct Repositories {
    users: Arc<dyn UsersRepo>,
    groups: Arc<dyn GroupsRepo>,
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
    health: Arc<dyn StoreHealth>,
}

impl Repositories {
    fn from_postgres(db: PostgresRepositories) -> Self {
        let db = Arc::new(db);
        Self {
            users: db.clone(),
            groups: db.clone(),
            posts: db.clone(),
            posts_write: db.clone(),
            comments: db.clone(),
            follows: db.clone(),
            health: db,
        }
    }

    fn from_memory(store: Arc<MemoryRepositories>) -> Self {
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            posts_write: store.clone(),
            comments: store.clone(),
            follows: store.clone(),
            health: store,
        }
    }
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    match settings.database.url.as_deref() {
        Some(url) => {
            let pool =
                PostgresRepositories::connect(url, settings.database.max_connections.get())
                    .await
                    .map_err(|err| InfraError::database(err.to_string()))?;
            PostgresRepositories::run_migrations(&pool)
                .await
                .map_err(|err| InfraError::database(err.to_string()))?;
            info!("connected to postgres");
            Ok(Repositories::from_postgres(PostgresRepositories::new(pool)))
        }
        None => {
            warn!("no database url configured, using the embedded in-memory store");
            Ok(Repositories::from_memory(Arc::new(
                MemoryRepositories::new(),
            )))
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let feed = Arc::new(FeedService::new(
        repositories.posts.clone(),
        repositories.groups.clone(),
        repositories.users.clone(),
        repositories.follows.clone(),
        settings.feed.page_size.get(),
    ));
    let posts = Arc::new(PostService::new(
        repositories.posts.clone(),
        repositories.posts_write.clone(),
        repositories.comments.clone(),
        repositories.groups.clone(),
    ));
    let comments = Arc::new(CommentService::new(
        repositories.posts.clone(),
        repositories.comments.clone(),
    ));
    let relationships = Arc::new(RelationshipService::new(
        repositories.users.clone(),
        repositories.follows.clone(),
    ));

    let cache_config = CacheConfig::from(&settings.cache);
    let feed_cache = cache_config
        .enabled
        .then(|| Arc::new(FeedCache::new(&cache_config, Arc::new(SystemClock))));
    let cache_state = feed_cache.clone().map(|cache| CacheState {
        config: cache_config,
        feed: cache,
    });

    let public_router = build_public_router(HttpState {
        feed,
        posts,
        comments,
        relationships,
        groups: repositories.groups.clone(),
        cache: cache_state,
    });
    let admin_router = build_admin_router(AdminState {
        users: repositories.users.clone(),
        groups: repositories.groups.clone(),
        health: repositories.health.clone(),
        cache: feed_cache,
    });

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(InfraError::Io)?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(InfraError::Io)?;

    info!(
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listeners started"
    );

    let public = async {
        axum::serve(public_listener, public_router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };
    let admin = async {
        axum::serve(admin_listener, admin_router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    try_join!(public, admin).map_err(InfraError::Io)?;
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::unexpected("migrate requires a database url"))?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    info!("migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(error = %error, "failed to listen for shutdown signal");
    }
}
