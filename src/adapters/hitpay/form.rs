//! Form bodies for HitPay requests.
//!
//! Wire quirks: booleans are `"true"` or the empty string, unset optional
//! fields are omitted, and list fields repeat the key with a `[]` suffix.

use std::fmt::Display;

use rust_decimal::Decimal;

use crate::domain::payment::{
    PaymentRequest, RecurringBillingRequest, RecurringChargeRequest, RefundRequest,
};

const EXPIRY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const START_DATE_FORMAT: &str = "%Y-%m-%d";

/// Ordered form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: &str, value: impl Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    pub fn amount(self, key: &str, value: Decimal) -> Self {
        self.text(key, value)
    }

    pub fn flag(self, key: &str, value: bool) -> Self {
        self.text(key, if value { "true" } else { "" })
    }

    pub fn optional<T: Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.text(key, v),
            None => self,
        }
    }

    pub fn list(mut self, key: &str, values: &[String]) -> Self {
        let key = format!("{}[]", key);
        for value in values {
            self.fields.push((key.clone(), value.clone()));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Body of `POST payment-requests`.
pub fn payment_request(request: &PaymentRequest) -> FormBody {
    let p = request.params();
    FormBody::new()
        .amount("amount", p.amount)
        .list("payment_methods", &p.payment_methods)
        .text("currency", &p.currency)
        .text("email", &p.payer_email)
        .text("purpose", &p.purpose)
        .text("name", &p.payer_name)
        .text("reference_number", &p.reference_number)
        .text("redirect_url", &p.redirect_url)
        .text("webhook", &p.webhook_url)
        .flag("allow_repeated_payments", p.allow_repeated_payments)
        .optional(
            "expiry_date",
            p.expiry_date.map(|d| d.format(EXPIRY_DATE_FORMAT)),
        )
        .flag("send_email", p.send_email)
}

/// Body of `POST recurring-billing`.
pub fn recurring_billing(request: &RecurringBillingRequest) -> FormBody {
    let p = request.params();
    FormBody::new()
        .optional("plan_id", p.plan_id.as_deref())
        .text("customer_email", &p.customer_email)
        .text("customer_name", &p.customer_name)
        .text("start_date", p.start_date.format(START_DATE_FORMAT))
        .text("redirect_url", &p.redirect_url)
        .text("reference", &p.reference)
        .amount("amount", p.amount)
        .text("currency", &p.currency)
        .text("webhook", &p.webhook_url)
        .flag("save_card", p.save_card)
        .optional("times_to_be_charge", p.charge_count)
        .flag("send_email", p.send_email)
}

/// Body of `POST charge/recurring-billing/{id}`.
pub fn recurring_charge(request: &RecurringChargeRequest) -> FormBody {
    FormBody::new()
        .amount("amount", request.amount())
        .text("currency", request.currency())
}

/// Body of `POST refund`.
pub fn refund(request: &RefundRequest) -> FormBody {
    FormBody::new()
        .amount("amount", request.amount())
        .text("payment_id", request.payment_id())
}
