//! Leg records.
//!
//! A leg is one instrument-side of a (possibly multi-leg) order. Three leg
//! shapes exist, each a superset of the previous one:
//!
//! - [`CancelLeg`]: cumulative and order quantity
//! - [`ModifyLeg`]: adds side, order type, price and cumulative value
//! - [`OrderLeg`]: adds leaves quantity, kept at `max(orderQty - cumQty, 0)`
//!
//! Zero prices and order quantities in an update mean "unchanged".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_state::value_objects::fixed::rescale;
use crate::domain::order_state::value_objects::{Ndp, OrdType, Side, ValNdp, Value};

/// How an update is merged into persisted leg state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// Request terms only; cumulative fields are left alone.
    Request,
    /// Acknowledgment: cumulative quantity and value are taken as well.
    Ack,
}

/// Read access to the fields a leg update may carry.
pub trait LegView {
    /// Cumulative filled quantity.
    fn cum_qty(&self) -> Value;
    /// Quantity decimal places.
    fn qty_ndp(&self) -> Ndp;
    /// Order quantity, if set.
    fn order_qty(&self) -> Option<Value>;
    /// Side, if carried.
    fn side(&self) -> Option<Side> {
        None
    }
    /// Order type, if carried.
    fn ord_type(&self) -> Option<OrdType> {
        None
    }
    /// Price and its decimal places, if set.
    fn px(&self) -> Option<(Value, Ndp)> {
        None
    }
    /// Cumulative traded value and its decimal places, if carried.
    fn cum_value(&self) -> Option<(Value, Ndp)> {
        None
    }
}

/// A leg that can absorb updates.
pub trait Leg: LegView + Clone + Default {
    /// Merges `u` into this leg.
    fn update<U: LegView + ?Sized>(&mut self, u: &U, merge: Merge);

    /// Widens this leg to the worst-case exposure implied by `u`.
    fn expose<U: LegView + ?Sized>(&mut self, u: &U);
}

const fn nonzero(v: Value) -> Option<Value> {
    if v == 0 { None } else { Some(v) }
}

// ============================================
// CancelLeg
// ============================================

/// Quantity state of a leg, carried by cancels and cancel acks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelLeg {
    /// Cumulative filled quantity.
    pub cum_qty: Value,
    /// Quantity decimal places.
    pub qty_ndp: Ndp,
    /// Order quantity.
    pub order_qty: Value,
}

/// Merges quantity fields of `u` into `(cum_qty, order_qty, qty_ndp)`.
fn merge_qty<U: LegView + ?Sized>(
    cum_qty: &mut Value,
    order_qty: &mut Value,
    qty_ndp: &mut Ndp,
    u: &U,
    merge: Merge,
) {
    if *cum_qty == 0 && *order_qty == 0 {
        *qty_ndp = u.qty_ndp();
    } else if u.qty_ndp() > *qty_ndp && (merge == Merge::Ack || u.order_qty().is_some()) {
        let ndp = u.qty_ndp();
        *cum_qty = rescale(*cum_qty, *qty_ndp, ndp);
        *order_qty = rescale(*order_qty, *qty_ndp, ndp);
        *qty_ndp = ndp;
    }
    if merge == Merge::Ack {
        *cum_qty = rescale(u.cum_qty(), u.qty_ndp(), *qty_ndp);
    }
    if let Some(qty) = u.order_qty() {
        *order_qty = rescale(qty, u.qty_ndp(), *qty_ndp);
    }
}

impl LegView for CancelLeg {
    fn cum_qty(&self) -> Value {
        self.cum_qty
    }
    fn qty_ndp(&self) -> Ndp {
        self.qty_ndp
    }
    fn order_qty(&self) -> Option<Value> {
        nonzero(self.order_qty)
    }
}

impl Leg for CancelLeg {
    fn update<U: LegView + ?Sized>(&mut self, u: &U, merge: Merge) {
        merge_qty(
            &mut self.cum_qty,
            &mut self.order_qty,
            &mut self.qty_ndp,
            u,
            merge,
        );
    }

    fn expose<U: LegView + ?Sized>(&mut self, u: &U) {
        if let Some(qty) = u.order_qty() {
            self.order_qty = self.order_qty.max(rescale(qty, u.qty_ndp(), self.qty_ndp));
        }
    }
}

impl fmt::Display for CancelLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "orderQty={} cumQty={}",
            ValNdp::new(self.order_qty, self.qty_ndp),
            ValNdp::new(self.cum_qty, self.qty_ndp)
        )
    }
}

// ============================================
// ModifyLeg
// ============================================

/// Full terms of a leg, carried by modifies and modify acks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifyLeg {
    /// Side.
    pub side: Option<Side>,
    /// Order type.
    pub ord_type: Option<OrdType>,
    /// Limit price (reference price for market orders).
    pub px: Value,
    /// Price decimal places.
    pub px_ndp: Ndp,
    /// Cumulative traded value (FIX GrossTradeAmt), in price NDP.
    pub cum_value: Value,
    /// Order quantity.
    pub order_qty: Value,
    /// Cumulative filled quantity.
    pub cum_qty: Value,
    /// Quantity decimal places.
    pub qty_ndp: Ndp,
}

impl ModifyLeg {
    /// Rescales price and cumulative value up to `ndp`; never narrows.
    pub fn widen_px_ndp(&mut self, ndp: Ndp) {
        if ndp > self.px_ndp {
            self.px = rescale(self.px, self.px_ndp, ndp);
            self.cum_value = rescale(self.cum_value, self.px_ndp, ndp);
            self.px_ndp = ndp;
        }
    }

    /// Rescales quantities up to `ndp`; never narrows.
    pub fn widen_qty_ndp(&mut self, ndp: Ndp) {
        if ndp > self.qty_ndp {
            self.order_qty = rescale(self.order_qty, self.qty_ndp, ndp);
            self.cum_qty = rescale(self.cum_qty, self.qty_ndp, ndp);
            self.qty_ndp = ndp;
        }
    }
}

impl LegView for ModifyLeg {
    fn cum_qty(&self) -> Value {
        self.cum_qty
    }
    fn qty_ndp(&self) -> Ndp {
        self.qty_ndp
    }
    fn order_qty(&self) -> Option<Value> {
        nonzero(self.order_qty)
    }
    fn side(&self) -> Option<Side> {
        self.side
    }
    fn ord_type(&self) -> Option<OrdType> {
        self.ord_type
    }
    fn px(&self) -> Option<(Value, Ndp)> {
        nonzero(self.px).map(|px| (px, self.px_ndp))
    }
    fn cum_value(&self) -> Option<(Value, Ndp)> {
        Some((self.cum_value, self.px_ndp))
    }
}

impl Leg for ModifyLeg {
    fn update<U: LegView + ?Sized>(&mut self, u: &U, merge: Merge) {
        merge_qty(
            &mut self.cum_qty,
            &mut self.order_qty,
            &mut self.qty_ndp,
            u,
            merge,
        );
        if let Some(side) = u.side() {
            match self.side {
                None => self.side = Some(side),
                Some(current) if current.may_change_to(side) => self.side = Some(side),
                Some(_) => {}
            }
        }
        if let Some(ord_type) = u.ord_type() {
            self.ord_type = Some(ord_type);
        }
        if let Some((px, ndp)) = u.px() {
            if self.px == 0 && self.cum_value == 0 {
                self.px_ndp = ndp;
            } else {
                self.widen_px_ndp(ndp);
            }
            self.px = rescale(px, ndp, self.px_ndp);
        }
        if let (Merge::Ack, Some((value, ndp))) = (merge, u.cum_value()) {
            self.widen_px_ndp(ndp);
            self.cum_value = rescale(value, ndp, self.px_ndp);
        }
    }

    fn expose<U: LegView + ?Sized>(&mut self, u: &U) {
        if let Some(qty) = u.order_qty() {
            self.order_qty = self.order_qty.max(rescale(qty, u.qty_ndp(), self.qty_ndp));
        }
        // shorts are riskier than sells; other side changes are invalid
        let escalate = matches!(
            (self.side, u.side()),
            (Some(current), Some(side)) if side.is_short() && current.is_sell()
        );
        if escalate {
            self.side = u.side();
        }
        if let Some((px, ndp)) = u.px() {
            let px = rescale(px, ndp, self.px_ndp);
            self.px = if self.side == Some(Side::Buy) {
                self.px.max(px)
            } else {
                self.px.min(px)
            };
        }
    }
}

impl fmt::Display for ModifyLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(side) = self.side {
            write!(f, "side={side} ")?;
        }
        if let Some(ord_type) = self.ord_type {
            write!(f, "ordType={ord_type} ")?;
        }
        write!(
            f,
            "px={} cumValue={} orderQty={} cumQty={}",
            ValNdp::new(self.px, self.px_ndp),
            ValNdp::new(self.cum_value, self.px_ndp),
            ValNdp::new(self.order_qty, self.qty_ndp),
            ValNdp::new(self.cum_qty, self.qty_ndp)
        )
    }
}

// ============================================
// OrderLeg
// ============================================

/// Persisted state of a working order's leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderLeg {
    /// Side.
    pub side: Option<Side>,
    /// Order type.
    pub ord_type: Option<OrdType>,
    /// Limit price (reference price for market orders).
    pub px: Value,
    /// Price decimal places.
    pub px_ndp: Ndp,
    /// Cumulative traded value, in price NDP.
    pub cum_value: Value,
    /// Order quantity.
    pub order_qty: Value,
    /// Cumulative filled quantity.
    pub cum_qty: Value,
    /// Quantity decimal places.
    pub qty_ndp: Ndp,
    /// Remaining quantity, `max(orderQty - cumQty, 0)`.
    pub leaves_qty: Value,
}

impl OrderLeg {
    /// Creates a leg for a new order.
    #[must_use]
    pub fn new(side: Side, ord_type: OrdType, px: Value, px_ndp: Ndp, qty: Value, qty_ndp: Ndp) -> Self {
        let mut leg = Self {
            side: Some(side),
            ord_type: Some(ord_type),
            px,
            px_ndp,
            order_qty: qty,
            qty_ndp,
            ..Self::default()
        };
        leg.update_leaves_qty();
        leg
    }

    /// Recomputes `leaves_qty` from `order_qty` and `cum_qty`.
    pub fn update_leaves_qty(&mut self) {
        self.leaves_qty = (self.order_qty - self.cum_qty).max(0);
    }

    /// Rescales price and cumulative value up to `ndp`; never narrows.
    pub fn widen_px_ndp(&mut self, ndp: Ndp) {
        let mut terms = self.terms();
        terms.widen_px_ndp(ndp);
        self.set_terms(terms);
    }

    /// Rescales quantities, leaves included, up to `ndp`; never narrows.
    pub fn widen_qty_ndp(&mut self, ndp: Ndp) {
        let mut terms = self.terms();
        terms.widen_qty_ndp(ndp);
        self.set_terms(terms);
    }

    /// Returns the leg's terms without leaves.
    #[must_use]
    pub const fn terms(&self) -> ModifyLeg {
        ModifyLeg {
            side: self.side,
            ord_type: self.ord_type,
            px: self.px,
            px_ndp: self.px_ndp,
            cum_value: self.cum_value,
            order_qty: self.order_qty,
            cum_qty: self.cum_qty,
            qty_ndp: self.qty_ndp,
        }
    }

    fn set_terms(&mut self, terms: ModifyLeg) {
        self.side = terms.side;
        self.ord_type = terms.ord_type;
        self.px = terms.px;
        self.px_ndp = terms.px_ndp;
        self.cum_value = terms.cum_value;
        self.order_qty = terms.order_qty;
        self.cum_qty = terms.cum_qty;
        self.qty_ndp = terms.qty_ndp;
        self.update_leaves_qty();
    }
}

impl LegView for OrderLeg {
    fn cum_qty(&self) -> Value {
        self.cum_qty
    }
    fn qty_ndp(&self) -> Ndp {
        self.qty_ndp
    }
    fn order_qty(&self) -> Option<Value> {
        nonzero(self.order_qty)
    }
    fn side(&self) -> Option<Side> {
        self.side
    }
    fn ord_type(&self) -> Option<OrdType> {
        self.ord_type
    }
    fn px(&self) -> Option<(Value, Ndp)> {
        nonzero(self.px).map(|px| (px, self.px_ndp))
    }
    fn cum_value(&self) -> Option<(Value, Ndp)> {
        Some((self.cum_value, self.px_ndp))
    }
}

impl Leg for OrderLeg {
    fn update<U: LegView + ?Sized>(&mut self, u: &U, merge: Merge) {
        let mut terms = self.terms();
        terms.update(u, merge);
        self.set_terms(terms);
    }

    fn expose<U: LegView + ?Sized>(&mut self, u: &U) {
        let mut terms = self.terms();
        terms.expose(u);
        self.set_terms(terms);
    }
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} leavesQty={}",
            self.terms(),
            ValNdp::new(self.leaves_qty, self.qty_ndp)
        )
    }
}

// ============================================
// Legs
// ============================================

/// Ordered sequence of legs, updated pairwise by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Legs<L>(Vec<L>);

impl<L: Leg> Default for Legs<L> {
    fn default() -> Self {
        Self(vec![L::default()])
    }
}

impl<L: Leg> From<Vec<L>> for Legs<L> {
    fn from(legs: Vec<L>) -> Self {
        if legs.is_empty() {
            Self::default()
        } else {
            Self(legs)
        }
    }
}

impl<L: Leg> Legs<L> {
    /// Single-leg sequence.
    #[must_use]
    pub fn single(leg: L) -> Self {
        Self(vec![leg])
    }

    /// Number of legs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no legs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leg at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&L> {
        self.0.get(index)
    }

    /// Mutable leg at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut L> {
        self.0.get_mut(index)
    }

    /// Iterates over the legs.
    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.0.iter()
    }

    /// Iterates mutably over the legs.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, L> {
        self.0.iter_mut()
    }

    /// Merges `u` leg by leg.
    pub fn update<U: LegView>(&mut self, u: &Legs<U>, merge: Merge) {
        for (leg, update) in self.0.iter_mut().zip(&u.0) {
            leg.update(update, merge);
        }
    }

    /// Widens every leg to the worst-case exposure implied by `u`.
    pub fn expose<U: LegView>(&mut self, u: &Legs<U>) {
        for (leg, update) in self.0.iter_mut().zip(&u.0) {
            leg.expose(update);
        }
    }

    /// Returns true if `u` claims more fills on any leg than recorded here,
    /// i.e. an ack carrying `u` must wait for fills to catch up.
    #[must_use]
    pub fn pending<U: LegView>(&self, u: &Legs<U>) -> bool {
        self.0.iter().zip(&u.0).any(|(leg, update)| {
            leg.cum_qty() < rescale(update.cum_qty(), update.qty_ndp(), leg.qty_ndp())
        })
    }

    /// Returns true if every leg is fully filled.
    #[must_use]
    pub fn filled(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|leg| leg.cum_qty() >= leg.order_qty().unwrap_or(0))
    }

    /// Copies these legs, cumulative fields included, into another leg shape.
    #[must_use]
    pub fn snapshot<T: Leg>(&self) -> Legs<T> {
        Legs(
            self.0
                .iter()
                .map(|leg| {
                    let mut out = T::default();
                    out.update(leg, Merge::Ack);
                    out
                })
                .collect(),
        )
    }
}

impl<L: fmt::Display> fmt::Display for Legs<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "legs=[")?;
        for (i, leg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{i}={{{leg}}}")?;
        }
        write!(f, "]")
    }
}
