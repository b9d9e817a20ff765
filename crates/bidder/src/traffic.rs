use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;

use hermes_core::{AuctionId, BidSink};

use crate::bidder::Bidder;

/// Launch the bid traffic: one task per planned bid, which sleeps out its
/// think delay and then pushes the bid into the sink.
///
/// A `false` from the sink means ingestion already stopped or the queue
/// was full; the producer does not retry. Returned handles let the caller
/// abort producers still sleeping once the run is over.
pub fn spawn_traffic(
    bidders: Vec<Bidder>,
    auction_ids: &[AuctionId],
    sink: Arc<dyn BidSink>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();
    for mut bidder in bidders {
        let planned = bidder.plan(auction_ids);
        let bidder_id = bidder.id().clone();
        debug!("{} plans {} bids", bidder_id, planned.len());

        for bid in planned {
            let sink = sink.clone();
            let bidder_id = bidder_id.clone();
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(bid.delay).await;
                if !sink.submit(bid.auction_id, bidder_id.clone(), bid.amount) {
                    debug!("{} bid refused (run over or queue full)", bidder_id);
                }
            }));
        }
    }
    handles
}
