use anyhow::{Context, bail};
use servicehub_models::{Booking, ListPage, Notification, UserType, WorkerProfile};
use servicehub_services::dashboard::{DashboardHook, DashboardLoader};
use servicehub_services::{
    AdminApi, AdminDashboard, BookingApi, CheckoutReturn, CustomerDashboard, EndpointSource,
    NotificationFeed, PageQuery, PagedTable, PaymentsApi, SignUpForm, WorkerDashboard,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app::App;
use crate::{BookingAction, Commands, NotificationAction, PayAction, WorkerAction};

pub async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    let result = match command {
        Commands::Login { email, password } => login(app, &email, &password).await,
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            role,
            postcode,
            phone,
        } => {
            let form = SignUpForm {
                email,
                password,
                first_name,
                last_name,
                user_type: role.into(),
                phone,
                postcode,
                address: None,
                city: None,
            };
            let profile = app.session.sign_up(&form).await?;
            app.print(&profile, |p| format!("Registered {} ({})", p.full_name(), p.user_type))
        }
        Commands::Logout => {
            app.session.sign_out().await;
            Ok(())
        }
        Commands::Whoami => {
            let session = app.require_session().await?;
            app.print(&session.profile, |p| {
                format!("{} <{}> {} {}", p.full_name(), p.email, p.user_type, p.id)
            })
        }
        Commands::Notifications { action } => notifications(app, action).await,
        Commands::Dashboard => dashboard(app).await,
        Commands::Bookings { action } => bookings(app, action).await,
        Commands::Workers { action } => workers(app, action).await,
        Commands::Pay { action } => pay(app, action).await,
    };
    // Let the toast printer drain before the runtime shuts down.
    tokio::task::yield_now().await;
    result
}

async fn login(app: &App, email: &str, password: &str) -> anyhow::Result<()> {
    let profile = app.session.sign_in(email, password).await?;
    info!(user_id = %profile.id, "Logged in");
    app.print(&profile, |p| format!("Signed in as {} ({})", p.full_name(), p.user_type))
}

fn notification_line(n: &Notification) -> String {
    let mark = if n.is_read { " " } else { "*" };
    format!(
        "{mark} {} {} {}: {}",
        n.created_at.format("%Y-%m-%d %H:%M"),
        n.id,
        n.title,
        n.message
    )
}

async fn notifications(app: &App, action: NotificationAction) -> anyhow::Result<()> {
    let session = app.require_session().await?;
    let feed = Arc::new(NotificationFeed::new(Arc::clone(&app.client), app.toasts.clone()));
    feed.set_user(Some(session.user_id));

    match action {
        NotificationAction::List { unread } => {
            feed.refresh().await?;
            let items: Vec<_> = feed
                .notifications()
                .into_iter()
                .filter(|n| !unread || !n.is_read)
                .collect();
            app.print(&items, |items| {
                let mut out = format!("{} unread", feed.unread_count());
                for n in items {
                    out.push('\n');
                    out.push_str(&notification_line(n));
                }
                out
            })
        }
        NotificationAction::Read { id } => {
            feed.refresh().await?;
            feed.mark_as_read(id).await?;
            println!("{} unread", feed.unread_count());
            Ok(())
        }
        NotificationAction::ReadAll => {
            feed.refresh().await?;
            feed.mark_all_as_read().await?;
            println!("{} unread", feed.unread_count());
            Ok(())
        }
        NotificationAction::Watch { seconds } => {
            let handle = feed.start(
                app.session.subscribe(),
                app.settings.notifications.poll_interval(),
            );
            let mut last = None;
            let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
            loop {
                let unread = feed.unread_count();
                if last != Some(unread) {
                    println!("{unread} unread");
                    last = Some(unread);
                }
                if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.stop();
            Ok(())
        }
    }
}

async fn show_dashboard<L>(app: &App, loader: L, text: impl FnOnce(&L::Output) -> String) -> anyhow::Result<()>
where
    L: DashboardLoader,
    L::Output: serde::Serialize,
{
    let hook = DashboardHook::new(loader, &app.settings.dashboard, app.toasts.clone());
    let stats = hook.load().await?;
    app.print(&stats, text)
}

async fn dashboard(app: &App) -> anyhow::Result<()> {
    let session = app.require_session().await?;
    let client = Arc::clone(&app.client);
    match session.profile.user_type {
        UserType::Admin => {
            show_dashboard(app, AdminDashboard::new(client), |s| {
                format!(
                    "users {} (growth {}%)\nworkers {} ({} awaiting verification)\n\
                     activation requests {}\nopen reports {}\nbookings {} ({}% completed)\nrevenue {:.2}",
                    s.total_users,
                    s.user_growth_rate,
                    s.total_workers,
                    s.pending_verifications,
                    s.pending_activation_requests,
                    s.open_reports,
                    s.total_bookings,
                    s.booking_completion_rate,
                    s.revenue
                )
            })
            .await
        }
        UserType::Customer => {
            show_dashboard(app, CustomerDashboard::new(client, session.user_id), |s| {
                let next = s
                    .next_booking
                    .as_ref()
                    .and_then(|b| b.scheduled_at)
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "none".to_string());
                format!(
                    "active bookings {}\ncompleted {}\nspent {:.2}\nreviews {}\nnext booking {next}",
                    s.active_bookings, s.completed_bookings, s.total_spent, s.reviews_written
                )
            })
            .await
        }
        UserType::Worker => {
            show_dashboard(app, WorkerDashboard::new(client, session.user_id), |s| {
                format!(
                    "earnings {:.2} ({:.2} this month)\nrating {} from {} reviews\n\
                     completion {}%\npending requests {}",
                    s.total_earnings,
                    s.month_earnings,
                    s.average_rating,
                    s.review_count,
                    s.completion_rate,
                    s.pending_requests
                )
            })
            .await
        }
    }
}

fn page_footer<T>(page: &ListPage<T>) -> String {
    format!(
        "page {}/{} ({} total)",
        page.page,
        page.total_pages().max(1),
        page.total_count
    )
}

async fn bookings(app: &App, action: BookingAction) -> anyhow::Result<()> {
    let session = app.require_session().await?;
    let page_size = app.settings.tables.page_size;
    let table = PagedTable::new(
        EndpointSource::bookings(Arc::clone(&app.client)),
        page_size,
        app.toasts.clone(),
    );
    let scope = match session.profile.user_type {
        UserType::Customer => Some("customer_id"),
        UserType::Worker => Some("worker_id"),
        UserType::Admin => None,
    };
    let mut query = PageQuery::new(1, page_size);
    if let Some(key) = scope {
        query = query.filter(key, session.user_id.to_string());
    }

    match action {
        BookingAction::List { page } => {
            let page = table.fetch(query.with_page(page)).await?;
            app.print(&page, |page| {
                let mut out = String::new();
                for b in &page.items {
                    out.push_str(&booking_line(b));
                    out.push('\n');
                }
                out.push_str(&page_footer(page));
                out
            })
        }
        BookingAction::Status { id, status } => {
            let api = BookingApi::new(Arc::clone(&app.client));
            table.fetch(query).await?;
            if table.item(id).is_none() {
                bail!("Booking {id} is not on the first page of your bookings");
            }
            table.set_status(&api, id, status.into()).await?;
            let updated = table.item(id).context("booking vanished after update")?;
            app.print(&updated, booking_line)
        }
    }
}

fn booking_line(b: &Booking) -> String {
    let when = b
        .scheduled_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unscheduled".to_string());
    format!("{} {:?} {when} {:.2}", b.id, b.status, b.price)
}

async fn workers(app: &App, action: WorkerAction) -> anyhow::Result<()> {
    let session = app.require_session().await?;
    if session.profile.user_type != UserType::Admin {
        bail!("Only admins can manage workers");
    }
    let page_size = app.settings.tables.page_size;
    let table = PagedTable::new(
        EndpointSource::admin_workers(Arc::clone(&app.client)),
        page_size,
        app.toasts.clone(),
    );

    let worker_line = |w: &WorkerProfile| {
        let verified = if w.is_verified { "verified" } else { "unverified" };
        format!("{} {} {} <{}>", w.id, verified, w.first_name, w.email)
    };

    match action {
        WorkerAction::List { page } => {
            let page = table.go_to(page).await?;
            app.print(&page, |page| {
                let mut out = String::new();
                for w in &page.items {
                    out.push_str(&worker_line(w));
                    out.push('\n');
                }
                out.push_str(&page_footer(page));
                out
            })
        }
        WorkerAction::Verify { id } => {
            let api = AdminApi::new(Arc::clone(&app.client));
            table.reload().await?;
            table.verify_worker(&api, id).await?;
            match table.item(id) {
                Some(w) => app.print(&w, |w| worker_line(w)),
                None => {
                    println!("Worker {id} verified");
                    Ok(())
                }
            }
        }
    }
}

async fn pay(app: &App, action: PayAction) -> anyhow::Result<()> {
    app.require_session().await?;
    let api = PaymentsApi::new(Arc::clone(&app.client), app.toasts.clone());
    match action {
        PayAction::Checkout { offer_id } => {
            let session = api.create_checkout(offer_id).await?;
            app.print(&session, |s| format!("Open {} to pay", s.url))
        }
        PayAction::Complete { return_url } => {
            let ret = CheckoutReturn::parse(&return_url)?;
            if ret.is_cancelled() {
                bail!("Checkout was cancelled");
            }
            let payment = api.complete(&ret).await?;
            app.print(&payment, |p| format!("Payment {} {:?} {:.2}", p.id, p.status, p.amount))
        }
        PayAction::Status { session_id } => {
            let status = api.status(&session_id).await?;
            println!("{:?}", status.status);
            Ok(())
        }
    }
}
