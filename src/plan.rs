use crate::types::{ChunkPlan, ChunkRequest, RetrievalError, ServiceLimits, SplitAxis, TimeRange};

/// Splits a request into service-legal chunks along at most one axis.
///
/// Priority order is fixed:
///
/// 1. Fits both limits: one chunk, tagged [`SplitAxis::None`].
/// 2. Duration over the limit: split by time. The start walks forward in
///    steps of `time_chunk_usec` (the last chunk is truncated to the stop
///    time) and every chunk carries the full channel list.
/// 3. Channel count over the limit: split by channel. Contiguous groups of
///    `channel_chunk` ids (the last group may be shorter), every chunk
///    carrying the full time range.
///
/// A request over both limits at once is rejected with
/// [`RetrievalError::InvalidInput`]: splitting by time alone would emit
/// chunks that still violate the channel limit.
///
/// Time chunks are contiguous, non-overlapping, and sum to the original
/// duration; channel chunks partition the id list in order.
pub fn plan_chunks(
    range: TimeRange,
    channel_ids: &[usize],
    limits: &ServiceLimits,
) -> Result<ChunkPlan, RetrievalError> {
    if limits.time_chunk_usec == 0 || limits.channel_chunk == 0 {
        return Err(RetrievalError::InvalidInput(
            "chunk sizes must be positive".to_string(),
        ));
    }

    let duration = range.duration_usec();
    let over_duration = duration > limits.max_duration_usec;
    let over_channels = channel_ids.len() > limits.max_channels;

    if over_duration && over_channels {
        return Err(RetrievalError::InvalidInput(format!(
            "request exceeds both the duration limit ({} > {} us) and the channel limit \
             ({} > {}); narrow the time range or the channel selection",
            duration,
            limits.max_duration_usec,
            channel_ids.len(),
            limits.max_channels
        )));
    }

    if !over_duration && !over_channels {
        return Ok(ChunkPlan {
            chunks: vec![ChunkRequest {
                range,
                channel_ids: channel_ids.to_vec(),
            }],
            axis: SplitAxis::None,
        });
    }

    if over_duration {
        let mut chunks = Vec::new();
        let mut clip_start = range.start_usec();
        while clip_start < range.stop_usec() {
            let clip_stop = clip_start
                .saturating_add(limits.time_chunk_usec)
                .min(range.stop_usec());
            chunks.push(ChunkRequest {
                range: TimeRange::new(clip_start, clip_stop)?,
                channel_ids: channel_ids.to_vec(),
            });
            clip_start = clip_stop;
        }
        return Ok(ChunkPlan {
            chunks,
            axis: SplitAxis::Time,
        });
    }

    let chunks = channel_ids
        .chunks(limits.channel_chunk)
        .map(|group| ChunkRequest {
            range,
            channel_ids: group.to_vec(),
        })
        .collect();
    Ok(ChunkPlan {
        chunks,
        axis: SplitAxis::Channel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_duration: u64, max_channels: usize, time_chunk: u64, channel_chunk: usize) -> ServiceLimits {
        ServiceLimits {
            max_duration_usec: max_duration,
            max_channels,
            time_chunk_usec: time_chunk,
            channel_chunk,
        }
    }

    #[test]
    fn request_within_limits_is_a_single_chunk() {
        let range = TimeRange::new(0, 100).unwrap();
        let ids: Vec<usize> = (0..10).collect();
        let plan = plan_chunks(range, &ids, &limits(120, 100, 60, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::None);
        assert_eq!(plan.chunks.len(), 1);
        assert_eq!(plan.chunks[0].range, range);
        assert_eq!(plan.chunks[0].channel_ids, ids);
    }

    #[test]
    fn time_split_truncates_last_chunk() {
        let range = TimeRange::new(0, 130).unwrap();
        let ids: Vec<usize> = (0..3).collect();
        let plan = plan_chunks(range, &ids, &limits(120, 100, 60, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::Time);
        let windows: Vec<(u64, u64)> = plan
            .chunks
            .iter()
            .map(|c| (c.range.start_usec(), c.range.stop_usec()))
            .collect();
        assert_eq!(windows, vec![(0, 60), (60, 120), (120, 130)]);
        // Every chunk carries the full channel list.
        for chunk in &plan.chunks {
            assert_eq!(chunk.channel_ids, ids);
        }
    }

    #[test]
    fn time_chunks_are_contiguous_and_cover_the_range() {
        let range = TimeRange::new(37, 1_000).unwrap();
        let plan = plan_chunks(range, &[0], &limits(100, 100, 77, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::Time);

        let mut expected_start = range.start_usec();
        let mut total = 0;
        for chunk in &plan.chunks {
            assert_eq!(chunk.range.start_usec(), expected_start);
            expected_start = chunk.range.stop_usec();
            total += chunk.range.duration_usec();
        }
        assert_eq!(expected_start, range.stop_usec());
        assert_eq!(total, range.duration_usec());
    }

    #[test]
    fn channel_split_partitions_ids_in_order() {
        let range = TimeRange::new(0, 100).unwrap();
        let ids: Vec<usize> = (0..150).collect();
        let plan = plan_chunks(range, &ids, &limits(120, 100, 60, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::Channel);

        let sizes: Vec<usize> = plan.chunks.iter().map(|c| c.num_channels()).collect();
        assert_eq!(sizes, vec![20, 20, 20, 20, 20, 20, 20, 10]);

        let rejoined: Vec<usize> = plan
            .chunks
            .iter()
            .flat_map(|c| c.channel_ids.iter().copied())
            .collect();
        assert_eq!(rejoined, ids);

        for chunk in &plan.chunks {
            assert_eq!(chunk.range, range);
        }
    }

    #[test]
    fn time_split_wins_only_when_channels_fit() {
        // Duration over, channels under: time split carries all channels.
        let range = TimeRange::new(0, 500).unwrap();
        let ids: Vec<usize> = (0..90).collect();
        let plan = plan_chunks(range, &ids, &limits(120, 100, 60, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::Time);
        assert!(plan.chunks.iter().all(|c| c.num_channels() == 90));
    }

    #[test]
    fn exceeding_both_limits_is_rejected() {
        let range = TimeRange::new(0, 500).unwrap();
        let ids: Vec<usize> = (0..150).collect();
        assert!(matches!(
            plan_chunks(range, &ids, &limits(120, 100, 60, 20)),
            Err(RetrievalError::InvalidInput(_))
        ));
    }

    #[test]
    fn boundary_values_do_not_split() {
        // Exactly at both limits: still a single chunk.
        let range = TimeRange::new(0, 120).unwrap();
        let ids: Vec<usize> = (0..100).collect();
        let plan = plan_chunks(range, &ids, &limits(120, 100, 60, 20)).unwrap();
        assert_eq!(plan.axis, SplitAxis::None);
        assert_eq!(plan.chunks.len(), 1);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let range = TimeRange::new(0, 500).unwrap();
        assert!(plan_chunks(range, &[0], &limits(120, 100, 0, 20)).is_err());
    }
}
