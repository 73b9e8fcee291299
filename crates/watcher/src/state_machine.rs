use depositwatch_primitives::{dynamic_min_conf, format_atomic, U256};
use depositwatch_store::{
    self as store, JobLoadOutcome, JobPatch, JobRecord, JobStatus, StatusRecord,
};
use depositwatch_walletrpc::{best_observation, match_deposits, DepositObservation, TransferDestination};
use depositwatch_webhook::{dispatch, WebhookPayload};
use tracing::{info, warn};

use crate::{context::JobContext, error::WatcherError};

/// Runs the Job state machine once for `(ticker, payment_id)`. At most one
/// invocation per Job per scheduling pass; this function is the only
/// writer to the Job record it touches.
pub async fn run_job(ctx: &JobContext, payment_id: &str) -> Result<(), WatcherError> {
    // Step 1: load, delete if malformed.
    let mut job = match store::load_job_outcome(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await? {
        JobLoadOutcome::Missing => return Ok(()),
        JobLoadOutcome::Malformed => {
            warn!(ticker = %ctx.ticker, payment_id, "deleting malformed job (missing address)");
            store::delete_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
            return Ok(());
        }
        JobLoadOutcome::Found(job) => job,
    };

    // Step 2/3: backfill paymentId from Status if the Job's own field is
    // blank; skip RPC entirely if it's still unknown afterward.
    if !job.has_payment_id() {
        if let Some(status) = store::load_status(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await? {
            if !status.payment_id.is_empty() {
                job.payment_id = status.payment_id.clone();
                let patch = JobPatch::new().set("paymentId", job.payment_id.clone());
                store::patch_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, patch).await?;
            }
        }
        if !job.has_payment_id() {
            return Ok(());
        }
    }

    // Step 4: call the Matcher, upsert the Ledger for the best observation.
    let expected_asset_id = ctx.ticker_cfg.asset_id.as_deref().filter(|id| !id.is_empty());
    let observations = match_deposits(
        &ctx.wallet,
        &job.payment_id,
        expected_asset_id,
        ctx.current_height,
        ctx.recent_txs_count,
        ctx.wallet_call_timeout,
    )
    .await?;

    let Some(best) = best_observation(&observations).cloned() else {
        // Step 5: no observation yet.
        return Ok(());
    };

    store::upsert_ledger(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, &best.hash, &best.amount_atomic.to_string(), best.confirmations, ctx.now_ms).await?;

    // Step 6: apply the dynamic confirmation policy exactly once.
    let current_status = store::load_status(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
    let already_completed = current_status.as_ref().map(|s| s.status == JobStatus::Completed).unwrap_or(false);

    if !job.dynamic_min_conf_applied && !already_completed {
        let new_min_conf = dynamic_min_conf(best.amount_atomic, ctx.ticker_cfg.decimals);
        if new_min_conf != job.min_conf {
            job.min_conf = new_min_conf;
        }
        job.dynamic_min_conf_applied = true;
        let patch = JobPatch::new().set_u32("minConf", job.min_conf).set_bool("dynamicMinConfApplied", true);
        store::patch_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, patch).await?;
    }

    // Step 7: threshold check.
    if best.confirmations < job.min_conf {
        refresh_confirming(ctx, &job, payment_id, &best).await?;
        return Ok(());
    }

    // Step 8: idempotency guard.
    if store::is_seen(&*ctx.kv, &ctx.store_cfg, &best.hash).await? {
        store::delete_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
        return Ok(());
    }

    // Step 9: consolidation, at most once.
    let mut effective_amount_atomic = best.amount_atomic;
    let mut fee_atomic: Option<U256> = None;
    if ctx.ticker_cfg.consolidation.enabled && !job.consolidation_attempted {
        if best.confirmations >= ctx.ticker_cfg.consolidation.min_confirmations {
            let (consolidated_fee, tx_id, error) = attempt_consolidation(ctx, &best).await;
            job.consolidation_attempted = true;
            let mut patch = JobPatch::new().set_bool("consolidationAttempted", true);
            if let Some(fee) = consolidated_fee {
                fee_atomic = Some(fee);
                effective_amount_atomic = best.amount_atomic.saturating_sub(fee);
            }
            if let Some(tx_id) = &tx_id {
                patch = patch.set("consolidationTxId", tx_id.clone());
            }
            if let Some(error) = &error {
                patch = patch.set("consolidationError", error.clone());
            }
            store::patch_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, patch).await?;
        }
    }

    let payload = build_payload(ctx, &job, &best, effective_amount_atomic, fee_atomic);

    // Step 10: already completed, just pending cleanup.
    if job.webhook_sent {
        store::mark_seen(&*ctx.kv, &ctx.store_cfg, &best.hash).await?;
        store::delete_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
        return Ok(());
    }

    // Step 11: retry budgets.
    if let Some(first_attempt) = job.webhook_first_attempt_at {
        if ctx.now_ms - first_attempt > ctx.webhook_max_retry_window_ms {
            write_failed(ctx, &job, payment_id, "webhook retry window exceeded").await?;
            store::mark_seen(&*ctx.kv, &ctx.store_cfg, &best.hash).await?;
            store::delete_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
            return Ok(());
        }
    }
    if ctx.webhook_max_attempts > 0 && job.webhook_attempts >= ctx.webhook_max_attempts {
        return Ok(());
    }

    // Step 12: backoff window.
    if let Some(next_attempt) = job.webhook_next_attempt_at {
        if next_attempt > ctx.now_ms {
            return Ok(());
        }
    }

    // Step 13: refresh status before attempting.
    refresh_confirming(ctx, &job, payment_id, &best).await?;

    let Some(webhook_url) = ctx.ticker_cfg.webhook_url.clone() else {
        return Ok(());
    };

    // Step 14/15: dispatch and branch on outcome.
    let outcome = dispatch(&ctx.http, &payload, &webhook_url, &ctx.webhook_secret, ctx.webhook_timeout).await;
    ctx.metrics.webhook_attempts.increment(1);
    if outcome.ok {
        ctx.metrics.webhook_successes.increment(1);
        let status = StatusRecord {
            status: JobStatus::Completed,
            ticker: ctx.ticker.clone(),
            address: job.address.clone(),
            payment_id: payment_id.to_string(),
            client_reference: job.client_reference.clone(),
            confirmations: best.confirmations,
            required_confirmations: job.min_conf,
            hash: Some(best.hash.clone()),
            paid_amount: Some(format_atomic(best.amount_atomic, ctx.ticker_cfg.decimals)),
            paid_amount_atomic: Some(best.amount_atomic.to_string()),
            effective_amount: Some(format_atomic(effective_amount_atomic, ctx.ticker_cfg.decimals)),
            effective_amount_atomic: Some(effective_amount_atomic.to_string()),
            fee_atomic: fee_atomic.map(|f| f.to_string()),
            created_at: job.created_at,
            updated_at: ctx.now_ms,
            webhook_error: None,
        };
        store::write_status(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, &status).await?;

        let patch = JobPatch::new()
            .set_bool("webhookSent", true)
            .set_opt("webhookFirstAttemptAt", None::<String>)
            .set_opt("webhookNextAttemptAt", None::<String>);
        store::patch_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, patch).await?;

        store::mark_seen(&*ctx.kv, &ctx.store_cfg, &best.hash).await?;
        store::delete_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id).await?;
        ctx.metrics.jobs_completed.increment(1);
        info!(ticker = %ctx.ticker, payment_id, hash = %best.hash, "webhook delivered, job completed");
    } else {
        let delay = ctx.backoff.delay_ms(job.webhook_attempts) as i64;
        let attempts = job.webhook_attempts + 1;
        let mut patch = JobPatch::new().set_u32("webhookAttempts", attempts).set_i64("webhookLastAttemptAt", ctx.now_ms);
        if job.webhook_first_attempt_at.is_none() {
            patch = patch.set_i64("webhookFirstAttemptAt", ctx.now_ms);
        }
        patch = patch.set_i64("webhookNextAttemptAt", ctx.now_ms + delay);
        if let Some(error) = &outcome.error {
            patch = patch.set("webhookLastError", error.clone());
        }
        store::patch_job(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, patch).await?;
        refresh_confirming(ctx, &job, payment_id, &best).await?;
        warn!(ticker = %ctx.ticker, payment_id, attempts, "webhook delivery failed, will retry");
    }

    Ok(())
}

async fn refresh_confirming(ctx: &JobContext, job: &JobRecord, payment_id: &str, best: &DepositObservation) -> Result<(), WatcherError> {
    let status = StatusRecord {
        status: JobStatus::Confirming,
        ticker: ctx.ticker.clone(),
        address: job.address.clone(),
        payment_id: payment_id.to_string(),
        client_reference: job.client_reference.clone(),
        confirmations: best.confirmations,
        required_confirmations: job.min_conf,
        hash: Some(best.hash.clone()),
        paid_amount: Some(format_atomic(best.amount_atomic, ctx.ticker_cfg.decimals)),
        paid_amount_atomic: Some(best.amount_atomic.to_string()),
        effective_amount: None,
        effective_amount_atomic: None,
        fee_atomic: None,
        created_at: job.created_at,
        updated_at: ctx.now_ms,
        webhook_error: job.webhook_last_error.clone(),
    };
    store::write_status(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, &status).await?;
    Ok(())
}

async fn write_failed(ctx: &JobContext, job: &JobRecord, payment_id: &str, reason: &str) -> Result<(), WatcherError> {
    let status = StatusRecord {
        status: JobStatus::Failed,
        ticker: ctx.ticker.clone(),
        address: job.address.clone(),
        payment_id: payment_id.to_string(),
        client_reference: job.client_reference.clone(),
        confirmations: 0,
        required_confirmations: job.min_conf,
        hash: None,
        paid_amount: None,
        paid_amount_atomic: None,
        effective_amount: None,
        effective_amount_atomic: None,
        fee_atomic: None,
        created_at: job.created_at,
        updated_at: ctx.now_ms,
        webhook_error: Some(reason.to_string()),
    };
    store::write_status(&*ctx.kv, &ctx.store_cfg, &ctx.ticker, payment_id, &status).await
}

fn build_payload(ctx: &JobContext, job: &JobRecord, best: &DepositObservation, effective_amount_atomic: U256, fee_atomic: Option<U256>) -> WebhookPayload {
    let decimals = ctx.ticker_cfg.decimals;
    WebhookPayload {
        payment_id: job.payment_id.clone(),
        address: job.address.clone(),
        amount: format_atomic(best.amount_atomic, decimals),
        amount_atomic: best.amount_atomic.to_string(),
        paid_amount: format_atomic(best.amount_atomic, decimals),
        paid_amount_atomic: best.amount_atomic.to_string(),
        effective_amount: format_atomic(effective_amount_atomic, decimals),
        effective_amount_atomic: effective_amount_atomic.to_string(),
        fee_atomic: fee_atomic.map(|f| f.to_string()),
        confirmations: best.confirmations,
        hash: best.hash.clone(),
        ticker: ctx.ticker.clone(),
        client_reference: job.client_reference.clone(),
        created_at: Some(job.created_at),
    }
}

async fn attempt_consolidation(ctx: &JobContext, best: &DepositObservation) -> (Option<U256>, Option<String>, Option<String>) {
    let Some(address) = ctx.ticker_cfg.consolidation.address.clone() else {
        return (None, None, Some("consolidation enabled without an address".to_string()));
    };
    let fee_atomic = ctx
        .ticker_cfg
        .consolidation
        .fee_atomic
        .as_deref()
        .and_then(parse_atomic_to_u256)
        .unwrap_or(U256::ZERO);

    let destination_amount = best.amount_atomic.saturating_sub(fee_atomic);
    let destination = TransferDestination { address, amount: destination_amount.to_string() };

    match ctx
        .wallet
        .transfer(
            &[destination],
            &fee_atomic.to_string(),
            ctx.ticker_cfg.consolidation.mixin,
            0,
            false,
            ctx.ticker_cfg.consolidation.priority,
            ctx.wallet_call_timeout,
        )
        .await
    {
        Ok(result) => (Some(fee_atomic), Some(result.tx_hash), None),
        Err(err) => (None, None, Some(err.to_string())),
    }
}

fn parse_atomic_to_u256(raw: &str) -> Option<U256> {
    U256::from_str_radix(raw, 10).ok()
}
