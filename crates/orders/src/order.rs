use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_catalog::ProductId;
use tradepost_core::{AggregateId, AggregateRoot, UserId};

use crate::error::OrderError;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for OrderId {
    type Err = tradepost_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Order line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemId(pub AggregateId);

impl OrderItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
///
/// `PENDING → PAID → SHIPPED → {DELIVERED, CANCELLED}`; the last two are
/// terminal. Transitions are gated by [`Order::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = tradepost_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(tradepost_core::DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// The identity attempting a status change, classified relative to one order.
///
/// Classification happens once, in the orchestrator, via
/// [`Order::classify_actor`]; the transition function itself never looks
/// identities up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Actor {
    Buyer(UserId),
    Seller(UserId),
}

impl Actor {
    pub fn user_id(self) -> UserId {
        match self {
            Actor::Buyer(id) | Actor::Seller(id) => id,
        }
    }
}

/// Order line: product, quantity, unit price snapshotted at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    id: OrderItemId,
    product_id: ProductId,
    quantity: u32,
    /// Price in smallest currency unit (e.g., cents), fixed at order creation.
    unit_price: u64,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price: u64) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::invariant("quantity must be greater than 0"));
        }
        if unit_price == 0 {
            return Err(OrderError::invariant("unit price must be greater than 0"));
        }
        if u64::from(quantity).checked_mul(unit_price).is_none() {
            return Err(OrderError::invariant("line total overflows"));
        }

        Ok(Self {
            id: OrderItemId::new(AggregateId::new()),
            product_id,
            quantity,
            unit_price,
        })
    }

    /// Reconstruct a line from durable state. Invariants are trusted.
    pub fn rehydrate(
        id: OrderItemId,
        product_id: ProductId,
        quantity: u32,
        unit_price: u64,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn total(&self) -> u64 {
        u64::from(self.quantity) * self.unit_price
    }
}

impl tradepost_core::Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: Order.
///
/// Identity, parties, total and items are fixed at creation; only `status`
/// (and `updated_at` alongside it) ever changes, and only through
/// [`Order::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    buyer_id: UserId,
    seller_id: UserId,
    total: u64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    items: Vec<OrderItem>,
    version: u64,
}

impl Order {
    /// Create a new order in `PENDING` status.
    ///
    /// The total is derived from the items; it is never supplied by callers.
    pub fn create(
        buyer_id: UserId,
        seller_id: UserId,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if buyer_id == seller_id {
            return Err(OrderError::SelfPurchase);
        }
        if items.is_empty() {
            return Err(OrderError::invariant("order must have at least one item"));
        }

        let total = items
            .iter()
            .try_fold(0u64, |sum, item| sum.checked_add(item.total()))
            .ok_or_else(|| OrderError::invariant("order total overflows"))?;
        if total == 0 {
            return Err(OrderError::invariant("order total must be greater than 0"));
        }

        let now = Utc::now();

        Ok(Self {
            id: OrderId::new(AggregateId::new()),
            buyer_id,
            seller_id,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            items,
            version: 0,
        })
    }

    /// Reconstruct an order from durable state. Invariants are trusted.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: OrderId,
        buyer_id: UserId,
        seller_id: UserId,
        total: u64,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        items: Vec<OrderItem>,
        version: u64,
    ) -> Self {
        Self {
            id,
            buyer_id,
            seller_id,
            total,
            status,
            created_at,
            updated_at,
            items,
            version,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Classify a caller relative to this order.
    ///
    /// Returns `None` when the caller is neither buyer nor seller; the
    /// orchestrator maps that to [`OrderError::Unauthorized`] before any
    /// transition is attempted.
    pub fn classify_actor(&self, user_id: UserId) -> Option<Actor> {
        if user_id == self.seller_id {
            Some(Actor::Seller(user_id))
        } else if user_id == self.buyer_id {
            Some(Actor::Buyer(user_id))
        } else {
            None
        }
    }

    /// The only legal way to change an order's status.
    ///
    /// Pure: returns a new `Order` with `status` replaced and `updated_at`
    /// bumped; everything else (items, total, parties, version) is carried
    /// over unchanged. Illegal `(from, to)` pairs fail with
    /// [`OrderError::InvalidTransition`]; legal pairs attempted by the wrong
    /// party fail with [`OrderError::Unauthorized`].
    pub fn transition(&self, new_status: OrderStatus, actor: Actor) -> Result<Self, OrderError> {
        use OrderStatus::*;

        let authorized = match (self.status, new_status) {
            (Pending, Paid) | (Paid, Shipped) => self.actor_is_seller(actor),
            (Shipped, Delivered) => self.actor_is_buyer(actor),
            (Shipped, Cancelled) => self.actor_is_buyer(actor) || self.actor_is_seller(actor),
            (from, to) => {
                return Err(OrderError::InvalidTransition { from, to });
            }
        };

        if !authorized {
            return Err(OrderError::Unauthorized);
        }

        let mut next = self.clone();
        next.status = new_status;
        next.updated_at = Utc::now();
        Ok(next)
    }

    fn actor_is_seller(&self, actor: Actor) -> bool {
        matches!(actor, Actor::Seller(id) if id == self.seller_id)
    }

    fn actor_is_buyer(&self, actor: Actor) -> bool {
        matches!(actor, Actor::Buyer(id) if id == self.buyer_id)
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_user() -> UserId {
        UserId::new()
    }

    fn test_product() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_item(quantity: u32, unit_price: u64) -> OrderItem {
        OrderItem::new(test_product(), quantity, unit_price).unwrap()
    }

    fn test_order() -> Order {
        Order::create(test_user(), test_user(), vec![test_item(2, 1000)]).unwrap()
    }

    /// An order moved to `status` by rehydration (transition shortcuts are
    /// exactly what these tests must not rely on).
    fn order_in_status(status: OrderStatus) -> Order {
        let order = test_order();
        Order::rehydrate(
            order.id_typed(),
            order.buyer_id(),
            order.seller_id(),
            order.total(),
            status,
            order.created_at(),
            order.updated_at(),
            order.items().to_vec(),
            order.version,
        )
    }

    #[test]
    fn item_total_is_quantity_times_unit_price() {
        let item = test_item(3, 250);
        assert_eq!(item.total(), 750);
    }

    #[test]
    fn item_rejects_zero_quantity_and_zero_price() {
        assert!(matches!(
            OrderItem::new(test_product(), 0, 100).unwrap_err(),
            OrderError::Invariant(_)
        ));
        assert!(matches!(
            OrderItem::new(test_product(), 1, 0).unwrap_err(),
            OrderError::Invariant(_)
        ));
    }

    #[test]
    fn item_rejects_overflowing_line_total() {
        // 3 * 9.2e18 does not fit in u64.
        let err = OrderItem::new(test_product(), 3, 9_200_000_000_000_000_000).unwrap_err();
        assert!(matches!(err, OrderError::Invariant(_)));
    }

    #[test]
    fn create_rejects_overflowing_order_total() {
        // Each line fits in u64 on its own; the sum does not.
        let items = vec![test_item(1, u64::MAX), test_item(1, 1)];
        let err = Order::create(test_user(), test_user(), items).unwrap_err();
        assert!(matches!(err, OrderError::Invariant(_)));
    }

    #[test]
    fn create_starts_pending_with_summed_total() {
        let order = Order::create(
            test_user(),
            test_user(),
            vec![test_item(2, 1000), test_item(1, 500)],
        )
        .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total(), 2500);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.created_at(), order.updated_at());
    }

    #[test]
    fn create_rejects_self_purchase() {
        let user = test_user();
        let err = Order::create(user, user, vec![test_item(1, 100)]).unwrap_err();
        assert_eq!(err, OrderError::SelfPurchase);
    }

    #[test]
    fn create_rejects_empty_items() {
        let err = Order::create(test_user(), test_user(), vec![]).unwrap_err();
        assert!(matches!(err, OrderError::Invariant(_)));
    }

    #[test]
    fn seller_marks_pending_order_paid() {
        let order = test_order();
        let paid = order
            .transition(OrderStatus::Paid, Actor::Seller(order.seller_id()))
            .unwrap();

        assert_eq!(paid.status(), OrderStatus::Paid);
        assert!(paid.updated_at() >= order.updated_at());
        // Everything else is untouched.
        assert_eq!(paid.id_typed(), order.id_typed());
        assert_eq!(paid.total(), order.total());
        assert_eq!(paid.items(), order.items());
    }

    #[test]
    fn buyer_cannot_mark_order_paid() {
        let order = test_order();
        let err = order
            .transition(OrderStatus::Paid, Actor::Buyer(order.buyer_id()))
            .unwrap_err();
        assert_eq!(err, OrderError::Unauthorized);
    }

    #[test]
    fn seller_ships_paid_order() {
        let order = order_in_status(OrderStatus::Paid);
        let shipped = order
            .transition(OrderStatus::Shipped, Actor::Seller(order.seller_id()))
            .unwrap();
        assert_eq!(shipped.status(), OrderStatus::Shipped);
    }

    #[test]
    fn buyer_confirms_delivery() {
        let order = order_in_status(OrderStatus::Shipped);
        let delivered = order
            .transition(OrderStatus::Delivered, Actor::Buyer(order.buyer_id()))
            .unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);
    }

    #[test]
    fn seller_cannot_confirm_delivery() {
        let order = order_in_status(OrderStatus::Shipped);
        let err = order
            .transition(OrderStatus::Delivered, Actor::Seller(order.seller_id()))
            .unwrap_err();
        assert_eq!(err, OrderError::Unauthorized);
    }

    #[test]
    fn either_party_cancels_shipped_order() {
        let order = order_in_status(OrderStatus::Shipped);

        let by_buyer = order
            .transition(OrderStatus::Cancelled, Actor::Buyer(order.buyer_id()))
            .unwrap();
        assert_eq!(by_buyer.status(), OrderStatus::Cancelled);

        let by_seller = order
            .transition(OrderStatus::Cancelled, Actor::Seller(order.seller_id()))
            .unwrap();
        assert_eq!(by_seller.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn mismatched_actor_identity_is_unauthorized() {
        // A claimed role with somebody else's id never passes the identity check.
        let order = test_order();
        let err = order
            .transition(OrderStatus::Paid, Actor::Seller(test_user()))
            .unwrap_err();
        assert_eq!(err, OrderError::Unauthorized);
    }

    #[test]
    fn pending_order_cannot_be_cancelled() {
        let order = test_order();
        let err = order
            .transition(OrderStatus::Cancelled, Actor::Buyer(order.buyer_id()))
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Cancelled
            }
        );
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            let order = order_in_status(terminal);
            for target in [
                OrderStatus::Pending,
                OrderStatus::Paid,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ] {
                for actor in [
                    Actor::Buyer(order.buyer_id()),
                    Actor::Seller(order.seller_id()),
                ] {
                    let err = order.transition(target, actor).unwrap_err();
                    assert_eq!(
                        err,
                        OrderError::InvalidTransition {
                            from: terminal,
                            to: target
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn classify_actor_matches_parties() {
        let order = test_order();
        assert_eq!(
            order.classify_actor(order.buyer_id()),
            Some(Actor::Buyer(order.buyer_id()))
        );
        assert_eq!(
            order.classify_actor(order.buyer_id()).unwrap().user_id(),
            order.buyer_id()
        );
        assert_eq!(
            order.classify_actor(order.seller_id()),
            Some(Actor::Seller(order.seller_id()))
        );
        assert_eq!(order.classify_actor(test_user()), None);
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Paid),
            Just(OrderStatus::Shipped),
            Just(OrderStatus::Delivered),
            Just(OrderStatus::Cancelled),
        ]
    }

    /// The legal-transition table, written out independently of the
    /// implementation so the property test cannot degenerate into comparing
    /// the code with itself.
    fn table_allows(from: OrderStatus, to: OrderStatus, seller_acting: bool) -> bool {
        use OrderStatus::*;
        match (from, to) {
            (Pending, Paid) | (Paid, Shipped) => seller_acting,
            (Shipped, Delivered) => !seller_acting,
            (Shipped, Cancelled) => true,
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn transition_agrees_with_legal_table(
            from in any_status(),
            to in any_status(),
            seller_acting in proptest::bool::ANY,
        ) {
            let order = order_in_status(from);
            let actor = if seller_acting {
                Actor::Seller(order.seller_id())
            } else {
                Actor::Buyer(order.buyer_id())
            };

            let outcome = order.transition(to, actor);
            if table_allows(from, to, seller_acting) {
                let next = outcome.unwrap();
                prop_assert_eq!(next.status(), to);
            } else {
                prop_assert!(outcome.is_err());
            }
        }
    }
}
