//! `storefront checkout`

use std::io::{BufRead, Write};
use std::sync::Arc;

use checkout::{
    CheckoutError, CheckoutSettings, Field, Navigator, NextStep, ProfileEditor, SagaCoordinator,
    SagaOutcome, SagaRun, ShippingProfile,
};
use tokio::task::JoinHandle;

use super::{line, signed_in};
use crate::error::{Result, StorefrontError};
use crate::{App, journal};

/// How the customer left the hosted payment page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    Paid,
    Cancel,
}

impl PaymentDecision {
    fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "paid" | "p" => Some(PaymentDecision::Paid),
            "cancel" | "c" => Some(PaymentDecision::Cancel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutOptions {
    /// Form fields to change before submitting.
    pub overrides: Vec<(Field, String)>,
    /// Answer for the payment page; asked on `input` when absent.
    pub decision: Option<PaymentDecision>,
}

/// Returns the terminal to the landing page.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate_home(&self) {
        tracing::info!("returned to landing page");
    }
}

/// Submits the cart as an order for the signed-in customer and walks the
/// customer through payment.
///
/// A run that placed no order ends in [`StorefrontError::OrderNotPlaced`]
/// after its message is printed.
pub async fn run<R: BufRead>(
    app: &App,
    options: CheckoutOptions,
    input: &mut R,
    out: &mut dyn Write,
) -> Result<SagaOutcome> {
    let customer = signed_in(app).await?;

    let mut editor = ProfileEditor::new(ShippingProfile::from_customer(&customer));
    if !options.overrides.is_empty() {
        editor.begin_edit();
        for (field, value) in options.overrides {
            editor.set(field, value)?;
        }
        editor.finish_edit();
    }
    let shipping = editor.into_profile();

    let client = app.client().clone();
    let coordinator = SagaCoordinator::new(
        app.store().clone(),
        client.clone(),
        client.clone(),
        client,
        Arc::new(ConsoleNavigator),
        CheckoutSettings::from(&app.config().checkout),
    );

    let report = match coordinator.submit(customer.id, &shipping).await {
        Ok(report) => report,
        Err(CheckoutError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                line(out, format_args!("{:<12} {message}", field.as_str()))?;
            }
            return Err(CheckoutError::Validation(errors).into());
        }
        Err(e) => return Err(e.into()),
    };

    write_journal(app, &report.run).await;
    line(out, report.outcome.user_message())?;

    match &report.outcome {
        SagaOutcome::Success {
            next: NextStep::AwaitPayment(_),
            ..
        } => {
            let mut controller = coordinator.payment_controller();
            let redirect_url = controller.present(report.run)?;
            line(out, format_args!("Pay at: {redirect_url}"))?;

            let decision = match options.decision {
                Some(decision) => decision,
                None => ask_decision(input, out)?,
            };
            match decision {
                PaymentDecision::Paid => {
                    let navigation = controller.confirm().await?;
                    write_journal(app, controller.run()).await;
                    line(out, "Payment noted. Thank you for your purchase.")?;
                    return_home(navigation, out).await?;
                }
                PaymentDecision::Cancel => {
                    controller.cancel()?;
                    write_journal(app, controller.run()).await;
                    line(
                        out,
                        "Payment not completed. Your order is waiting for payment and your cart was kept.",
                    )?;
                }
            }
        }
        SagaOutcome::Success { .. } => {
            if let Some(navigation) = report.navigation {
                return_home(navigation, out).await?;
            }
        }
        SagaOutcome::DegradedSuccess { .. } => {}
        SagaOutcome::FatalError { message } => {
            return Err(StorefrontError::OrderNotPlaced(message.clone()));
        }
    }

    Ok(report.outcome)
}

/// Asks until the answer is `paid` or `cancel`. End of input counts as cancel.
fn ask_decision<R: BufRead>(input: &mut R, out: &mut dyn Write) -> Result<PaymentDecision> {
    loop {
        write!(out, "Type 'paid' once payment is done, or 'cancel' to leave: ")
            .and_then(|_| out.flush())
            .map_err(|e| StorefrontError::io("<stdout>", e))?;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .map_err(|e| StorefrontError::io("<stdin>", e))?;
        if read == 0 {
            line(out, "")?;
            return Ok(PaymentDecision::Cancel);
        }
        if let Some(decision) = PaymentDecision::parse(&answer) {
            return Ok(decision);
        }
    }
}

async fn return_home(navigation: JoinHandle<()>, out: &mut dyn Write) -> Result<()> {
    line(out, "Returning to the store...")?;
    if let Err(e) = navigation.await {
        tracing::warn!(error = %e, "landing page navigation did not finish");
    }
    Ok(())
}

/// The journal is a record only; a failed write never changes the outcome.
async fn write_journal(app: &App, run: &SagaRun) {
    if let Err(e) = journal::write(&app.config().journal_dir(), run).await {
        tracing::warn!(error = %e, "failed to write saga journal");
    }
}
