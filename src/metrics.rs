//! Ranking metrics for binary podium predictions.

/// Indices of `scores` ordered by descending score.
fn descending(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<_> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Area under the ROC curve, computed from the rank-sum of the positive samples with tied scores
/// sharing their average rank. `None` unless both classes are present.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    assert_eq!(labels.len(), scores.len(), "labels and scores must be of equal length");
    let positives = labels.iter().filter(|&&label| label).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<_> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; a tie spanning [start, end) shares the mean of its ranks
        let rank = (start + end + 1) as f64 / 2.0;
        let tied_positives = order[start..end]
            .iter()
            .filter(|&&index| labels[index])
            .count();
        positive_rank_sum += rank * tied_positives as f64;
        start = end;
    }

    let positives = positives as f64;
    Some((positive_rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives as f64))
}

/// Average precision: the precision at each distinct score threshold, weighted by the increase in
/// recall from the previous threshold. `None` when there are no positive samples.
pub fn average_precision(labels: &[bool], scores: &[f64]) -> Option<f64> {
    assert_eq!(labels.len(), scores.len(), "labels and scores must be of equal length");
    let positives = labels.iter().filter(|&&label| label).count();
    if positives == 0 {
        return None;
    }

    let order = descending(scores);
    let (mut true_positives, mut seen) = (0, 0);
    let mut previous_recall = 0.0;
    let mut precision_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        true_positives += order[start..end]
            .iter()
            .filter(|&&index| labels[index])
            .count();
        seen += end - start;
        let recall = true_positives as f64 / positives as f64;
        let precision = true_positives as f64 / seen as f64;
        precision_sum += (recall - previous_recall) * precision;
        previous_recall = recall;
        start = end;
    }
    Some(precision_sum)
}
