//! Cashier business logic.
//!
//! A [`Cart`] collects priced lines for one client. Bath lines on a pet with
//! monthly-plan credit are priced at zero and redeem a credit when the sale is
//! confirmed. Confirming a sale with a plan or renewal line tops the client's
//! plan back up.

use crate::{
    config::PlanPolicy,
    core::{
        appointment,
        catalog,
        client::{self, Client},
        handoff::{self, HandoffKey, PendingRegistration, PendingRenewal, PendingSchedule},
    },
    entities::{ServiceKind, appointment as appointment_entity, catalog_item},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// How the client paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentMethod {
    /// Cash, the only method that gives change
    Cash,
    /// Instant bank transfer
    Pix,
    /// Debit card
    DebitCard,
    /// Credit card
    CreditCard,
}

impl PaymentMethod {
    /// Name printed on the receipt.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Pix => "Pix",
            Self::DebitCard => "Debit card",
            Self::CreditCard => "Credit card",
        }
    }
}

/// One priced entry in a cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    /// Identifier within the cart
    pub line_id: u32,
    /// Catalog name
    pub item_name: String,
    /// Catalog description
    pub description: String,
    /// Grooming service booked by this line, if any
    pub service_kind: Option<ServiceKind>,
    /// Resolved price; zero when covered by the plan
    pub price: f64,
    /// Pet (appointment record) the line is for
    pub appointment_id: Option<i64>,
    /// Paid with a monthly-plan credit
    pub using_plan: bool,
    /// Sells or renews a monthly plan
    pub is_plan: bool,
    /// Retail product
    pub is_product: bool,
}

/// The lines being sold to one client.
#[derive(Debug, Clone)]
pub struct Cart {
    client: Client,
    lines: Vec<CartLine>,
    discount_percent: f64,
    next_line_id: u32,
}

impl Cart {
    /// An empty cart for `client`.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
            lines: Vec::new(),
            discount_percent: 0.0,
            next_line_id: 1,
        }
    }

    /// The client being charged.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Lines in the order they were added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a catalog item for the pet on `appointment_id`, or for the client's
    /// first appointment when none is given.
    ///
    /// Bath and Bath and Trim are priced at zero while the pet's plan still has
    /// credit not already claimed by another line in this cart.
    ///
    /// # Errors
    /// Returns `Error::AppointmentNotFound` if the appointment is not one of the
    /// client's, or `Error::NoActivePlan` for a renewal without a current plan.
    pub fn add_item(
        &mut self,
        item: &catalog_item::Model,
        appointment_id: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<&CartLine> {
        self.add_priced(
            &item.name,
            &item.description,
            item.service_kind,
            item.price,
            item.is_product,
            appointment_id,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn add_priced(
        &mut self,
        name: &str,
        description: &str,
        service_kind: Option<ServiceKind>,
        price: f64,
        is_product: bool,
        appointment_id: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<&CartLine> {
        if price < 0.0 || !price.is_finite() {
            return Err(Error::InvalidAmount { amount: price });
        }

        let pet_id = self.resolve_pet(appointment_id)?.map(|pet| pet.id);

        if service_kind == Some(ServiceKind::PlanRenewal) && !self.client.has_active_plan(now) {
            return Err(Error::NoActivePlan {
                phone: self.client.phone.clone(),
            });
        }

        let using_plan = service_kind.is_some_and(ServiceKind::is_plan_coverable)
            && pet_id.is_some_and(|id| self.plan_credit_left(id, now) > 0);

        let line = CartLine {
            line_id: self.next_line_id,
            item_name: name.to_string(),
            description: description.to_string(),
            service_kind,
            price: if using_plan { 0.0 } else { price },
            appointment_id: pet_id,
            using_plan,
            is_plan: service_kind.is_some_and(ServiceKind::is_plan),
            is_product,
        };
        self.next_line_id += 1;
        debug!(
            "Cart line {} '{}' at {:.2}{}",
            line.line_id,
            line.item_name,
            line.price,
            if using_plan { " (plan)" } else { "" }
        );
        self.lines.push(line);
        Ok(&self.lines[self.lines.len() - 1])
    }

    fn resolve_pet(&self, appointment_id: Option<i64>) -> Result<Option<&appointment_entity::Model>> {
        match appointment_id {
            Some(id) => self
                .client
                .appointments
                .iter()
                .find(|a| a.id == id)
                .map(Some)
                .ok_or(Error::AppointmentNotFound { id }),
            None => Ok(self.client.appointments.first()),
        }
    }

    /// Plan credit on `appointment_id` not yet claimed by a line of this cart.
    fn plan_credit_left(&self, appointment_id: i64, now: NaiveDateTime) -> i32 {
        let Some(record) = self
            .client
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .filter(|a| client::has_plan_credit(a, now))
        else {
            return 0;
        };
        let claimed = self
            .lines
            .iter()
            .filter(|l| l.using_plan && l.appointment_id == Some(appointment_id))
            .count();
        record.monthly_baths_remaining.unwrap_or(0) - i32::try_from(claimed).unwrap_or(i32::MAX)
    }

    /// Removes a line.
    ///
    /// # Errors
    /// Returns `Error::CartLineNotFound` if no line has that id.
    pub fn remove_line(&mut self, line_id: u32) -> Result<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or(Error::CartLineNotFound { line_id })?;
        Ok(self.lines.remove(index))
    }

    /// Sets the percentage taken off the subtotal.
    ///
    /// # Errors
    /// Returns `Error::InvalidAmount` outside `0..=100`.
    pub fn set_discount_percent(&mut self, percent: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(Error::InvalidAmount { amount: percent });
        }
        self.discount_percent = percent;
        Ok(())
    }

    /// Current discount percentage.
    #[must_use]
    pub const fn discount_percent(&self) -> f64 {
        self.discount_percent
    }

    /// Sum of line prices.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(|l| l.price).sum()
    }

    /// Amount taken off by the discount.
    #[must_use]
    pub fn discount(&self) -> f64 {
        self.subtotal() * self.discount_percent / 100.0
    }

    /// Amount due.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.subtotal() - self.discount()
    }

    /// Change owed when `received` is handed over in cash.
    #[must_use]
    pub fn change_due(&self, received: f64) -> f64 {
        received - self.total()
    }
}

/// Payment handed over at the counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payment {
    /// How the client paid
    pub method: PaymentMethod,
    /// Cash handed over; ignored for other methods
    pub received: Option<f64>,
}

/// Confirmed sale.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    /// Client name
    pub owner: String,
    /// Client phone
    pub phone: String,
    /// Lines sold
    pub lines: Vec<CartLine>,
    /// Sum of line prices
    pub subtotal: f64,
    /// Discount percentage applied
    pub discount_percent: f64,
    /// Amount taken off
    pub discount: f64,
    /// Amount charged
    pub total: f64,
    /// Payment method
    pub method: PaymentMethod,
    /// Amount received
    pub received: f64,
    /// Change given back
    pub change: f64,
    /// New plan expiry, when the sale renewed a plan
    pub plan_expires_at: Option<NaiveDateTime>,
    /// When the sale was confirmed
    pub sold_at: NaiveDateTime,
}

impl fmt::Display for SaleReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RECEIPT {}", self.sold_at.format("%d/%m/%Y %H:%M"))?;
        writeln!(f, "Client: {} ({})", self.owner, self.phone)?;
        for line in &self.lines {
            if line.using_plan {
                writeln!(f, "  {} - Free (plan)", line.item_name)?;
            } else {
                writeln!(f, "  {} - R$ {:.2}", line.item_name, line.price)?;
            }
        }
        writeln!(f, "Subtotal: R$ {:.2}", self.subtotal)?;
        if self.discount > 0.0 {
            writeln!(
                f,
                "Discount ({}%): - R$ {:.2}",
                self.discount_percent, self.discount
            )?;
        }
        writeln!(f, "Total: R$ {:.2}", self.total)?;
        writeln!(f, "Payment: {}", self.method.label())?;
        if self.method == PaymentMethod::Cash {
            writeln!(f, "Received: R$ {:.2}", self.received)?;
            writeln!(f, "Change: R$ {:.2}", self.change)?;
        }
        if let Some(expires) = self.plan_expires_at {
            writeln!(f, "Plan valid until {}", expires.format("%d/%m/%Y"))?;
        }
        Ok(())
    }
}

/// Confirms the sale.
///
/// Redeems one plan credit per plan-covered line and, when the cart sells or
/// renews a plan, refills the client's plan with `policy.renewal_baths`. All
/// writes share one transaction.
///
/// # Errors
/// Returns `Error::EmptyCart`, `Error::InvalidAmount` when the discount exceeds
/// the subtotal, or `Error::InsufficientPayment` when cash does not cover the
/// total. Store errors roll the whole sale back.
#[instrument(skip(db, cart, policy), fields(phone = %cart.client.phone))]
pub async fn checkout(
    db: &DatabaseConnection,
    cart: &Cart,
    payment: Payment,
    policy: &PlanPolicy,
    now: NaiveDateTime,
) -> Result<SaleReceipt> {
    if cart.is_empty() {
        return Err(Error::EmptyCart);
    }
    let subtotal = cart.subtotal();
    let discount = cart.discount();
    if discount > subtotal {
        return Err(Error::InvalidAmount { amount: discount });
    }
    let total = subtotal - discount;

    let received = match payment.method {
        PaymentMethod::Cash => {
            let received = payment.received.unwrap_or(0.0);
            if !received.is_finite() || received < total {
                warn!("Rejected cash payment of {:.2} for {:.2}", received, total);
                return Err(Error::InsufficientPayment { received, total });
            }
            received
        }
        _ => total,
    };

    let txn = db.begin().await?;

    for line in cart.lines.iter().filter(|l| l.using_plan) {
        if let Some(id) = line.appointment_id {
            appointment::redeem_plan_bath(&txn, id).await?;
        }
    }

    let mut plan_expires_at = None;
    if cart.lines.iter().any(|l| l.is_plan) {
        let valid_until = policy.expiry_from(now);
        let renewing = cart
            .lines
            .iter()
            .any(|l| l.service_kind == Some(ServiceKind::PlanRenewal));
        match appointment::renew_plan(&txn, &cart.client.phone, policy.renewal_baths, valid_until)
            .await
        {
            Ok(_) => plan_expires_at = valid_until,
            Err(Error::PlanNotFound { phone }) if !renewing => {
                warn!("Plan sold to {} without a plan appointment to credit", phone);
            }
            Err(e) => return Err(e),
        }
    }

    txn.commit().await?;

    let receipt = SaleReceipt {
        owner: cart.client.owner.clone(),
        phone: cart.client.phone.clone(),
        lines: cart.lines.clone(),
        subtotal,
        discount_percent: cart.discount_percent,
        discount,
        total,
        method: payment.method,
        received,
        change: received - total,
        plan_expires_at,
        sold_at: now,
    };
    info!(
        "Sale to {} confirmed: {} line(s), total {:.2} by {}",
        receipt.owner,
        receipt.lines.len(),
        receipt.total,
        receipt.method.label()
    );
    Ok(receipt)
}

async fn take_or_skip<T>(db: &DatabaseConnection, key: HandoffKey) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match handoff::take_handoff(db, key).await {
        Err(Error::Serialization(_)) => Ok(None),
        other => other,
    }
}

/// Index of the cart for `phone`, opening one if needed.
/// Returns `None` when the phone has no appointments.
async fn cart_for(
    db: &DatabaseConnection,
    carts: &mut Vec<Cart>,
    phone: &str,
) -> Result<Option<usize>> {
    if let Some(index) = carts.iter().position(|c| c.client.phone == phone) {
        return Ok(Some(index));
    }
    match client::find_client(db, phone).await {
        Ok(found) => {
            carts.push(Cart::new(found));
            Ok(Some(carts.len() - 1))
        }
        Err(Error::ClientNotFound { .. }) => {
            warn!("Dropping hand-off for unknown client {}", phone);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Logs a hand-off line the cart refused, so the other envelopes still open.
fn skip_rejected(added: Result<&CartLine>, envelope: &str, phone: &str) {
    if let Err(e) = added {
        warn!("Dropping {} hand-off for {}: {}", envelope, phone, e);
    }
}

fn pet_matching<'a>(
    cart: &'a Cart,
    matches: impl Fn(&appointment_entity::Model) -> bool,
) -> Option<i64> {
    cart.client.pets().into_iter().find(|&a| matches(a)).map(|a| a.id)
}

/// Consumes every pending hand-off and opens the carts they describe, one per
/// client phone.
///
/// A registration is charged at the price quoted when it was taken. Renewals
/// and schedules are priced from the catalog. Schedules already paid for by the
/// plan produce nothing. Envelopes that do not parse, name an unknown client or
/// describe a line the cart refuses are dropped without affecting the others.
pub async fn open_pending_carts(db: &DatabaseConnection, now: NaiveDateTime) -> Result<Vec<Cart>> {
    let registration: Option<PendingRegistration> =
        take_or_skip(db, HandoffKey::PendingPetRegistration).await?;
    let renewal: Option<PendingRenewal> = take_or_skip(db, HandoffKey::PendingPlanRenewal).await?;
    let schedule: Option<PendingSchedule> =
        take_or_skip(db, HandoffKey::PendingServiceSchedule).await?;

    let mut carts = Vec::new();

    if let Some(pending) = registration {
        if let Some(index) = cart_for(db, &mut carts, &pending.phone).await? {
            let cart = &mut carts[index];
            let pet = pet_matching(cart, |a| {
                a.pet_name == pending.pet_name && a.breed == pending.breed
            });
            let added = cart.add_priced(
                pending.service_kind.label(),
                &pending.service_description,
                Some(pending.service_kind),
                pending.service_price,
                false,
                pet,
                now,
            );
            skip_rejected(added, "registration", &pending.phone);
        }
    }

    if let Some(pending) = renewal {
        let item = catalog::get_item_for_service(db, ServiceKind::PlanRenewal).await?;
        match item {
            Some(item) => {
                if let Some(index) = cart_for(db, &mut carts, &pending.phone).await? {
                    let added = carts[index].add_item(&item, None, now);
                    skip_rejected(added, "renewal", &pending.phone);
                }
            }
            None => warn!("No renewal item in the catalog; dropping renewal for {}", pending.owner),
        }
    }

    if let Some(pending) = schedule.filter(|s| !s.using_plan) {
        let item = catalog::get_item_for_service(db, pending.service_kind).await?;
        match item {
            Some(item) => {
                if let Some(index) = cart_for(db, &mut carts, &pending.phone).await? {
                    let cart = &mut carts[index];
                    let pet = pet_matching(cart, |a| a.pet_name == pending.pet_name);
                    let added = cart.add_item(&item, pet, now);
                    skip_rejected(added, "schedule", &pending.phone);
                }
            }
            None => warn!(
                "No catalog item books {}; dropping schedule for {}",
                pending.service_kind.label(),
                pending.pet_name
            ),
        }
    }

    carts.retain(|c| !c.is_empty());
    Ok(carts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::appointment::get_appointment_by_id;
    use crate::core::handoff::put_handoff;
    use crate::test_utils::*;

    const PHONE: &str = "+551199999999";

    fn item<'a>(catalog: &'a [catalog_item::Model], name: &str) -> &'a catalog_item::Model {
        catalog.iter().find(|i| i.name == name).unwrap()
    }

    fn cash(received: f64) -> Payment {
        Payment {
            method: PaymentMethod::Cash,
            received: Some(received),
        }
    }

    fn now() -> NaiveDateTime {
        at(2024, 3, 1, 12, 0)
    }

    #[tokio::test]
    async fn test_totals_and_discount() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        cart.add_item(item(&catalog, "Bath and Trim"), None, now())?;
        cart.add_item(item(&catalog, "Nail Clipping"), None, now())?;
        cart.set_discount_percent(10.0)?;

        assert_eq!(cart.subtotal(), 105.0);
        assert_eq!(cart.discount(), 10.5);
        assert_eq!(cart.total(), cart.subtotal() - cart.discount());
        assert_eq!(cart.change_due(100.0), 100.0 - 94.5);

        assert!(matches!(
            cart.set_discount_percent(101.0),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            cart.set_discount_percent(-1.0),
            Err(Error::InvalidAmount { .. })
        ));
        assert_eq!(cart.discount_percent(), 10.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_line() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let first = cart.add_item(item(&catalog, "Bath"), None, now())?.line_id;
        cart.add_item(item(&catalog, "Pet Perfume"), None, now())?;

        let removed = cart.remove_line(first)?;
        assert_eq!(removed.item_name, "Bath");
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.lines()[0].is_product);
        assert!(matches!(
            cart.remove_line(first),
            Err(Error::CartLineNotFound { line_id }) if line_id == first
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_appointment_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let result = cart.add_item(item(&catalog, "Bath"), Some(999), now());
        assert!(matches!(result, Err(Error::AppointmentNotFound { id: 999 })));
        assert!(cart.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_plan_covers_baths_until_credit_runs_out() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        let plan = create_plan_appointment(&db, "Luna", PHONE, 2).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let first = cart.add_item(item(&catalog, "Bath"), Some(plan.id), now())?.clone();
        let second = cart
            .add_item(item(&catalog, "Bath and Trim"), Some(plan.id), now())?
            .clone();
        let third = cart.add_item(item(&catalog, "Bath"), Some(plan.id), now())?.clone();
        let trim = cart.add_item(item(&catalog, "Full Trim"), Some(plan.id), now())?.clone();

        assert!(first.using_plan && first.price == 0.0);
        assert!(second.using_plan && second.price == 0.0);
        assert!(!third.using_plan);
        assert_eq!(third.price, 60.0);
        assert!(!trim.using_plan);
        assert_eq!(cart.subtotal(), 150.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_plan_does_not_cover() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        // default policy expires 30 days after 2024-03-01
        let plan = create_test_appointment(&db, "Luna", PHONE, ServiceKind::MonthlyPlan).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let line = cart.add_item(item(&catalog, "Bath"), Some(plan.id), at(2024, 4, 15, 9, 0))?;
        assert!(!line.using_plan);
        assert_eq!(line.price, 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_renewal_requires_active_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let result = cart.add_item(item(&catalog, "Plan Renewal"), None, now());
        assert!(matches!(result, Err(Error::NoActivePlan { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let policy = PlanPolicy::default();
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);

        let empty = checkout(&db, &cart, cash(100.0), &policy, now()).await;
        assert!(matches!(empty, Err(Error::EmptyCart)));

        cart.add_item(item(&catalog, "Bath"), None, now())?;
        let short = checkout(&db, &cart, cash(50.0), &policy, now()).await;
        assert!(matches!(
            short,
            Err(Error::InsufficientPayment { received, total }) if received == 50.0 && total == 60.0
        ));

        let missing = Payment {
            method: PaymentMethod::Cash,
            received: None,
        };
        let none = checkout(&db, &cart, missing, &policy, now()).await;
        assert!(matches!(none, Err(Error::InsufficientPayment { .. })));

        let nan = checkout(&db, &cart, cash(f64::NAN), &policy, now()).await;
        assert!(matches!(nan, Err(Error::InsufficientPayment { .. })));
        let infinite = checkout(&db, &cart, cash(f64::INFINITY), &policy, now()).await;
        assert!(matches!(infinite, Err(Error::InsufficientPayment { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cash_checkout_gives_change() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);
        cart.add_item(item(&catalog, "Bath and Trim"), None, now())?;
        cart.set_discount_percent(50.0)?;

        let receipt = checkout(&db, &cart, cash(50.0), &PlanPolicy::default(), now()).await?;

        assert_eq!(receipt.subtotal, 80.0);
        assert_eq!(receipt.discount, 40.0);
        assert_eq!(receipt.total, 40.0);
        assert_eq!(receipt.change, 10.0);
        assert_eq!(receipt.plan_expires_at, None);
        let printed = receipt.to_string();
        assert!(printed.contains("Total: R$ 40.00"));
        assert!(printed.contains("Change: R$ 10.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_card_checkout_ignores_received() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);
        cart.add_item(item(&catalog, "Pet Perfume"), None, now())?;

        let payment = Payment {
            method: PaymentMethod::CreditCard,
            received: None,
        };
        let receipt = checkout(&db, &cart, payment, &PlanPolicy::default(), now()).await?;

        assert_eq!(receipt.received, 35.0);
        assert_eq!(receipt.change, 0.0);
        assert!(!receipt.to_string().contains("Change"));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_redeems_plan_credit() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        let plan = create_plan_appointment(&db, "Luna", PHONE, 3).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);
        cart.add_item(item(&catalog, "Bath"), Some(plan.id), now())?;
        cart.add_item(item(&catalog, "Bath"), Some(plan.id), now())?;

        let receipt = checkout(&db, &cart, cash(0.0), &PlanPolicy::default(), now()).await?;

        assert_eq!(receipt.total, 0.0);
        assert!(receipt.to_string().contains("Free (plan)"));
        let after = get_appointment_by_id(&db, plan.id).await?.unwrap();
        assert_eq!(after.monthly_baths_remaining, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_renewal_checkout_refills_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        let plan = create_plan_appointment(&db, "Luna", PHONE, 1).await?;
        let policy = PlanPolicy::default();
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);
        cart.add_item(item(&catalog, "Bath"), Some(plan.id), now())?;
        cart.add_item(item(&catalog, "Plan Renewal"), None, now())?;

        let receipt = checkout(&db, &cart, cash(200.0), &policy, now()).await?;

        let expected_expiry = policy.expiry_from(now());
        assert_eq!(receipt.plan_expires_at, expected_expiry);
        assert_eq!(receipt.change, 20.0);
        let after = get_appointment_by_id(&db, plan.id).await?.unwrap();
        assert_eq!(after.monthly_baths_remaining, Some(policy.renewal_baths));
        assert_eq!(after.plan_expires_at, expected_expiry);
        Ok(())
    }

    #[tokio::test]
    async fn test_plan_sale_without_plan_record_still_confirms() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let mut cart = Cart::new(client::find_client(&db, PHONE).await?);
        cart.add_item(item(&catalog, "Monthly Plan"), None, now())?;

        let receipt = checkout(&db, &cart, cash(180.0), &PlanPolicy::default(), now()).await?;
        assert_eq!(receipt.plan_expires_at, None);
        assert!(receipt.lines[0].is_plan);
        Ok(())
    }

    #[tokio::test]
    async fn test_open_pending_carts() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_catalog(&db).await?;
        let rex = create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let thor = create_test_appointment(&db, "Thor", PHONE, ServiceKind::FullTrim).await?;

        put_handoff(
            &db,
            HandoffKey::PendingPetRegistration,
            &PendingRegistration {
                phone: PHONE.to_string(),
                pet_name: "Rex".to_string(),
                breed: "Poodle".to_string(),
                service_kind: ServiceKind::Bath,
                service_price: 55.0,
                service_description: "Welcome bath".to_string(),
            },
        )
        .await?;
        put_handoff(
            &db,
            HandoffKey::PendingServiceSchedule,
            &PendingSchedule {
                phone: PHONE.to_string(),
                pet_name: "Thor".to_string(),
                service_kind: ServiceKind::FullTrim,
                using_plan: false,
            },
        )
        .await?;
        put_handoff(
            &db,
            HandoffKey::PendingPlanRenewal,
            &PendingRenewal {
                phone: "+550000000000".to_string(),
                owner: "Nobody".to_string(),
            },
        )
        .await?;

        let carts = open_pending_carts(&db, now()).await?;

        assert_eq!(carts.len(), 1);
        let lines = carts[0].lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price, 55.0);
        assert_eq!(lines[0].appointment_id, Some(rex.id));
        assert_eq!(lines[1].item_name, "Full Trim");
        assert_eq!(lines[1].appointment_id, Some(thor.id));

        assert!(open_pending_carts(&db, now()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_envelope_does_not_drop_the_others() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_catalog(&db).await?;
        create_test_appointment(&db, "Rex", PHONE, ServiceKind::Bath).await?;
        let thor = create_test_appointment(&db, "Thor", PHONE, ServiceKind::FullTrim).await?;

        // No plan on record, so the cart refuses a renewal line.
        put_handoff(
            &db,
            HandoffKey::PendingPetRegistration,
            &PendingRegistration {
                phone: PHONE.to_string(),
                pet_name: "Rex".to_string(),
                breed: "Poodle".to_string(),
                service_kind: ServiceKind::PlanRenewal,
                service_price: 180.0,
                service_description: "Renewal".to_string(),
            },
        )
        .await?;
        put_handoff(
            &db,
            HandoffKey::PendingServiceSchedule,
            &PendingSchedule {
                phone: PHONE.to_string(),
                pet_name: "Thor".to_string(),
                service_kind: ServiceKind::FullTrim,
                using_plan: false,
            },
        )
        .await?;

        let carts = open_pending_carts(&db, now()).await?;

        assert_eq!(carts.len(), 1);
        let lines = carts[0].lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_name, "Full Trim");
        assert_eq!(lines[0].appointment_id, Some(thor.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_plan_paid_schedule_opens_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_catalog(&db).await?;
        create_plan_appointment(&db, "Luna", PHONE, 4).await?;
        put_handoff(
            &db,
            HandoffKey::PendingServiceSchedule,
            &PendingSchedule {
                phone: PHONE.to_string(),
                pet_name: "Luna".to_string(),
                service_kind: ServiceKind::Bath,
                using_plan: true,
            },
        )
        .await?;

        assert!(open_pending_carts(&db, now()).await?.is_empty());
        Ok(())
    }
}
