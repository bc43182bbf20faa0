use std::env;

use course_recommender::models::config::AppConfig;
use course_recommender::processing::embedding::FastEmbedEncoder;
use course_recommender::processing::ranking::CatalogIndex;
use course_recommender::processing::recommendation::{NO_MATCH_MESSAGE, Recommender};
use course_recommender::processing::{RecommendRequest, ZMQMessage, ZMQReply};
use course_recommender::repository::{CatalogReader, CsvCatalogRepository};

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let courses = match CsvCatalogRepository::new(&config.catalog_path).list_courses() {
        Ok(courses) => courses,
        Err(e) => {
            log::error!("Failed to load catalog: {e}");
            std::process::exit(1);
        }
    };

    let mut encoder =
        match FastEmbedEncoder::new(&config.embedding_model, config.model_cache_dir.clone()) {
            Ok(encoder) => encoder,
            Err(e) => {
                log::error!("Failed to load embedding model {}: {e}", config.embedding_model);
                std::process::exit(1);
            }
        };

    let index = match CatalogIndex::build(courses, &mut encoder) {
        Ok(index) => index,
        Err(e) => {
            log::error!("Failed to embed course titles: {e}");
            std::process::exit(1);
        }
    };

    let zmq_address = config.zmq_address.clone();
    let mut recommender = Recommender::new(index, encoder, config);

    let query = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    if !query.is_empty() {
        run_once(&mut recommender, query);
        return;
    }

    let context = zmq::Context::new();
    let responder = match context.socket(zmq::REP) {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Cannot create zmq socket: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = responder.bind(&zmq_address) {
        log::error!("Cannot bind to {zmq_address}: {e}");
        std::process::exit(1);
    }
    log::info!("Serving recommendations on {zmq_address}");

    loop {
        let msg = match responder.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to receive message: {e}");
                continue;
            }
        };

        let reply = recommender.process_raw_message(&msg);
        let payload = match serde_json::to_vec(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to serialize reply: {e}");
                br#"{"Error":"internal error"}"#.to_vec()
            }
        };

        if let Err(e) = responder.send(payload, 0) {
            log::error!("Failed to send reply: {e}");
        }
    }
}

/// Rank a single query with configured defaults and print the rows.
fn run_once(recommender: &mut Recommender<FastEmbedEncoder>, query: String) {
    let request = RecommendRequest {
        query,
        ..Default::default()
    };

    match recommender.process_message(ZMQMessage::Recommend(request)) {
        ZMQReply::Recommendations { fallback, rows } => {
            if fallback {
                println!("No close matches; showing titles containing the query.");
            }
            for row in rows {
                println!(
                    "{:.2}  {}  [{} | {} reviews | {}]  {}",
                    row.similarity,
                    row.title,
                    row.price,
                    row.review_count,
                    row.platform.label(),
                    row.url
                );
            }
        }
        ZMQReply::NoMatch { .. } => println!("{NO_MATCH_MESSAGE}"),
        ZMQReply::Error(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
        ZMQReply::Preview(_) => {}
    }
}
