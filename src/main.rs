use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messenger_client::context::ApplicationContext;
use messenger_client::controller::{
    AvatarTile, Controller, MessageView, MessagesController, PeopleController, PersonFilter,
    PreferencesController, PreferencesUpdate,
};
use messenger_client::model::Person;

#[derive(Parser)]
#[command(name = "messenger-client")]
#[command(about = "Terminal client for the messenger REST service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Service base URI
    #[arg(
        long,
        env = "MESSENGER_SERVICE_URI",
        default_value = "http://localhost:8001/services"
    )]
    service_uri: String,

    /// Sign-on email
    #[arg(long, env = "MESSENGER_EMAIL")]
    email: String,

    /// Sign-on password
    #[arg(long, env = "MESSENGER_PASSWORD")]
    password: String,

    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the root messages of the session owner's subjects
    Messages,
    /// Show the child messages of the given message
    Children { message: i64 },
    /// Post a message about the given subject
    Post { subject: i64, body: String },
    /// Show the session owner's observation sliders
    People,
    /// Query people by filter criteria
    Query {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        forename: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Observe the given person, or stop observing them
    Observe { person: i64 },
    /// Show the session owner's preferences
    Preferences,
    /// Update the session owner's preferences
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        given: Option<String>,
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Replace the session owner's avatar with the given image file
    Avatar { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("messenger_client={filter_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let context = Arc::new(ApplicationContext::new(&args.service_uri)?);
    context.sign_on(&args.email, &args.password).await?;

    match args.command {
        Command::Messages => {
            let views = display(&MessagesController::new(context.clone())).await?;
            print_messages(&views);
        }
        Command::Children { message } => {
            let views = MessagesController::new(context.clone())
                .child_messages(message)
                .await?;
            print_messages(&views);
        }
        Command::Post { subject, body } => {
            let identity = MessagesController::new(context.clone())
                .post_message(subject, &body)
                .await?;
            println!("message #{identity} persisted");
        }
        Command::People => {
            let view = display(&PeopleController::new(context.clone())).await?;
            println!("observing you:");
            print_tiles(&view.observing);
            println!("observed by you:");
            print_tiles(&view.observed);
        }
        Command::Query {
            email,
            forename,
            surname,
            street,
            postcode,
            city,
            limit,
        } => {
            let filter = PersonFilter {
                email,
                forename,
                surname,
                street,
                postcode,
                city,
                result_limit: limit,
                ..PersonFilter::default()
            };
            let tiles = PeopleController::new(context.clone())
                .query_people(&filter)
                .await?;
            print_tiles(&tiles);
        }
        Command::Observe { person } => {
            let owner = PeopleController::new(context.clone())
                .toggle_observation(person)
                .await?;
            println!(
                "now observing {} people",
                owner.people_observed_references.len()
            );
        }
        Command::Preferences => {
            let owner = display(&PreferencesController::new(context.clone())).await?;
            print_preferences(&owner);
        }
        Command::Update {
            email,
            given,
            family,
            street,
            postcode,
            city,
            new_password,
        } => {
            let update = PreferencesUpdate {
                email,
                given,
                family,
                street,
                postcode,
                city,
            };
            let owner = PreferencesController::new(context.clone())
                .persist(&update, new_password.as_deref())
                .await?;
            print_preferences(&owner);
        }
        Command::Avatar { file } => {
            let content = tokio::fs::read(&file).await?;
            let content_type = mime_guess::from_path(&file)
                .first_or_octet_stream()
                .to_string();
            PreferencesController::new(context.clone())
                .persist_avatar(content, &content_type)
                .await?;
            println!("avatar updated");
        }
    }

    context.sign_off().await;
    Ok(())
}

async fn display<C: Controller>(controller: &C) -> anyhow::Result<C::View> {
    match controller.display().await {
        Ok(view) => Ok(view),
        Err(error) => {
            controller.display_error(&error);
            Err(error.into())
        }
    }
}

fn print_messages(views: &[MessageView]) {
    for view in views {
        println!(
            "#{} {} {}",
            view.message.identity,
            view.author_email,
            format_timestamp(view.message.creation_timestamp)
        );
        println!("  {}", view.message.body);
    }
}

fn print_tiles(tiles: &[AvatarTile]) {
    for tile in tiles {
        println!(
            "#{} {} <{}> {}",
            tile.person.identity, tile.title, tile.person.email, tile.avatar_uri
        );
    }
}

fn print_preferences(owner: &Person) {
    println!("#{} {:?}", owner.identity, owner.group);
    println!("email:    {}", owner.email);
    println!("name:     {} {}", owner.name.given, owner.name.family);
    println!(
        "address:  {}, {} {}",
        owner.address.street, owner.address.postcode, owner.address.city
    );
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|instant| instant.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
