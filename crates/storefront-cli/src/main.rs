//! Storefront CLI - a command-line client for the storefront API.
//!
//! Browse services, manage a local cart, check out with the split
//! deposit/final payment flow and inspect orders from the terminal.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_core::models::{LoginCredentials, ProjectRequestStatus, RegisterData};
use storefront_core::storage::KeyValueStore;
use storefront_core::{Cart, Config, SessionClient};

// ============================================================================
// Constants
// ============================================================================

/// Directory for a daily-rotated log file, in addition to stderr
const LOG_DIR_ENV: &str = "STOREFRONT_LOG_DIR";

const USAGE: &str = "\
Usage: storefront <command> [args]

Commands:
  login [email]              Log in (password is prompted)
  register                   Create an account
  logout                     Forget the stored session
  whoami                     Check the session and show the current user
  services                   List services on offer
  cart [list]                Show the cart
  cart add <serviceId> [qty] Add a service to the cart
  cart remove <serviceId>    Remove a service from the cart
  cart clear                 Empty the cart
  checkout                   Create an order from the cart and get the deposit link
  pay-balance <orderId>      Get the payment link for an order's remaining balance
  orders                     List your orders
  requests [status]          List project requests (admin)
";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "storefront.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprint!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load()?;
    let storage = config.open_storage()?;
    let session = SessionClient::with_timeout(
        &config.api_url(),
        Arc::clone(&storage),
        config.request_timeout(),
    )?;
    debug!(api_url = %session.base_url(), command = %command, "Storefront CLI starting");

    match command.as_str() {
        "login" => login(&session, &mut config, args.get(1).cloned()).await,
        "register" => register(&session).await,
        "logout" => {
            session.logout();
            println!("Logged out.");
            Ok(())
        }
        "whoami" => whoami(&session).await,
        "services" => list_services(&session).await,
        "cart" => cart_command(&session, storage, &args[1..]).await,
        "checkout" => checkout(&session, storage).await,
        "pay-balance" => {
            let order_id = args.get(1).context("Usage: storefront pay-balance <orderId>")?;
            pay_balance(&session, order_id).await
        }
        "orders" => list_orders(&session).await,
        "requests" => list_project_requests(&session, args.get(1)).await,
        "help" | "--help" | "-h" => {
            print!("{}", USAGE);
            Ok(())
        }
        other => {
            eprint!("{}", USAGE);
            bail!("Unknown command: {}", other)
        }
    }
}

/// Read one trimmed line from stdin after printing `label`
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn format_amount(amount: f64) -> String {
    format!("{:.2} EUR", amount)
}

async fn login(session: &SessionClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))?;

    let auth = session
        .login(&LoginCredentials::new(email.clone(), password))
        .await?;

    if config.last_email.as_deref() != Some(email.as_str()) {
        config.last_email = Some(email.clone());
        config.save()?;
    }

    match auth.user {
        Some(user) => println!("Logged in as {} <{}>.", user.full_name(), user.email),
        None => println!("Logged in as {}.", email),
    }
    Ok(())
}

async fn register(session: &SessionClient) -> Result<()> {
    let email = prompt("Email: ")?;
    let first_name = prompt("First name: ")?;
    let last_name = prompt("Last name: ")?;
    let phone = prompt("Phone: ")?;
    let company = prompt("Company (optional): ")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let data = RegisterData {
        email,
        first_name,
        last_name,
        password,
        phone,
        company: (!company.is_empty()).then_some(company),
    };
    session.register(&data).await?;

    if session.is_authenticated() {
        println!("Account created, you are now logged in.");
    } else {
        println!("Account created. Log in with `storefront login {}`.", data.email);
    }
    Ok(())
}

async fn whoami(session: &SessionClient) -> Result<()> {
    if !session.check_auth().await {
        println!("Not logged in.");
        return Ok(());
    }
    if let Some(user) = session.current_user() {
        println!("{} <{}>", user.full_name(), user.email);
        println!("Role: {}", user.role.label());
        if let Some(company) = user.company {
            println!("Company: {}", company);
        }
    }
    Ok(())
}

async fn list_services(session: &SessionClient) -> Result<()> {
    let services = session.services().list_active().await?;
    if services.is_empty() {
        println!("No services available.");
        return Ok(());
    }
    for service in services {
        println!(
            "{:<26} {:<18} {:>14}  {}",
            service.id.as_deref().unwrap_or("-"),
            service.service_type.label(),
            format_amount(service.base_price),
            service.name
        );
    }
    Ok(())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in cart.items() {
        println!(
            "{:>3} x {:<30} {:>14}",
            item.quantity,
            item.service.name,
            format_amount(item.total_amount)
        );
    }
    println!("Total: {} ({} items)", format_amount(cart.total()), cart.item_count());
}

async fn cart_command(
    session: &SessionClient,
    storage: Arc<dyn KeyValueStore>,
    args: &[String],
) -> Result<()> {
    let mut cart = Cart::load(storage);

    match args.first().map(String::as_str) {
        None | Some("list") => {}
        Some("add") => {
            let service_id = args.get(1).context("Usage: storefront cart add <serviceId> [qty]")?;
            let quantity = match args.get(2) {
                Some(q) => q.parse::<u32>().context("Quantity must be a positive number")?,
                None => 1,
            };
            let service = session.services().get(service_id).await?;
            if !service.is_active {
                bail!("{} is not currently offered", service.name);
            }
            cart.add(&service, quantity.max(1));
            println!("Added {} x {}.", quantity.max(1), service.name);
        }
        Some("remove") => {
            let service_id = args.get(1).context("Usage: storefront cart remove <serviceId>")?;
            cart.remove(service_id);
        }
        Some("clear") => cart.clear(),
        Some(other) => bail!("Unknown cart command: {}", other),
    }

    print_cart(&cart);
    Ok(())
}

async fn checkout(session: &SessionClient, storage: Arc<dyn KeyValueStore>) -> Result<()> {
    if !session.check_auth().await {
        bail!("You need to log in before checking out");
    }
    let user_id = session
        .current_user()
        .and_then(|u| u.id)
        .context("Profile has no user id")?;

    let mut cart = Cart::load(storage);
    let new_order = cart.prepare_order(&user_id)?;
    let order = session.orders().create_with_items(&new_order).await?;
    let order_id = order.id.clone().context("Created order has no id")?;
    info!(order_id = %order_id, "Order created from cart");

    let payment = session.payments().deposit_session(&order_id).await?;
    cart.clear();

    println!("Order {} created.", order.reference());
    println!(
        "Total {}, deposit due now {}.",
        format_amount(order.total_amount),
        format_amount(order.deposit_amount)
    );
    println!("Pay the deposit at: {}", payment.url);
    Ok(())
}

async fn pay_balance(session: &SessionClient, order_id: &str) -> Result<()> {
    let order = session.orders().get(order_id).await?;
    let payment = session.payments().final_session(order_id).await?;
    println!(
        "Order {}: balance due {}.",
        order.reference(),
        format_amount(order.balance_amount())
    );
    println!("Pay the balance at: {}", payment.url);
    Ok(())
}

async fn list_orders(session: &SessionClient) -> Result<()> {
    let orders = session.orders().mine().await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }
    for order in orders {
        println!(
            "{:<9} {:<12} {:<24} {:>14}",
            order.reference(),
            order.status_main.label(),
            order.status_payment.label(),
            format_amount(order.total_amount)
        );
    }
    Ok(())
}

fn parse_request_status(value: &str) -> Result<ProjectRequestStatus> {
    let status = match value.to_ascii_uppercase().as_str() {
        "PENDING" => ProjectRequestStatus::Pending,
        "QUOTED" => ProjectRequestStatus::Quoted,
        "ACCEPTED" => ProjectRequestStatus::Accepted,
        "REJECTED" => ProjectRequestStatus::Rejected,
        "ARCHIVED" => ProjectRequestStatus::Archived,
        other => bail!("Unknown project request status: {}", other),
    };
    Ok(status)
}

async fn list_project_requests(session: &SessionClient, status: Option<&String>) -> Result<()> {
    let status = status.map(|s| parse_request_status(s)).transpose()?;
    let requests = session.project_requests().list(status).await?;
    if requests.is_empty() {
        println!("No project requests.");
        return Ok(());
    }
    for request in requests {
        println!(
            "{:<10} {:<28} {:>14}  due {}",
            request.status.label(),
            request.email,
            format_amount(request.estimated_total),
            request.desired_deadline
        );
    }
    Ok(())
}
