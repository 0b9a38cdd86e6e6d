use crate::model::Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interference {
    pub period: Ticks,
    pub wcet: Ticks,
}

impl Interference {
    pub fn new(period: Ticks, wcet: Ticks) -> Self {
        Self { period, wcet }
    }

    /// Demand of all releases that arrive in `[0, window)`.
    pub fn demand(&self, window: Ticks) -> Ticks {
        window.div_ceil(self.period).saturating_mul(self.wcet)
    }
}

/// Least fixed point of `R = own_wcet + sum(ceil(R / T_j) * C_j)`.
///
/// The iteration starts from `own_wcet + sum(C_j)` and stops as soon as it
/// either converges or passes `deadline`, so the returned value is either a
/// response-time bound `<= deadline` or some value `> deadline` that
/// certifies the task unschedulable. Every period must be positive.
///
/// Sums saturate at `Ticks::MAX`, past any deadline a validated task can have.
pub fn solve(own_wcet: Ticks, interferences: &[Interference], deadline: Ticks) -> Ticks {
    let mut response = interferences
        .iter()
        .fold(own_wcet, |acc, i| acc.saturating_add(i.wcet));
    if response > deadline {
        return response;
    }

    loop {
        let next = interferences
            .iter()
            .fold(own_wcet, |acc, i| acc.saturating_add(i.demand(response)));

        if next == response || next > deadline {
            return next;
        }
        response = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_interference_is_own_wcet() {
        assert_eq!(solve(7, &[], 10), 7);
    }

    #[test]
    fn initial_excess_returns_immediately() {
        let hp = [Interference::new(20, 5), Interference::new(50, 10)];
        assert_eq!(solve(20, &hp, 30), 35);
    }

    #[test]
    fn iterates_to_fixed_point() {
        let hp = [Interference::new(20, 5), Interference::new(50, 10)];
        assert_eq!(solve(20, &hp, 100), 40);
    }

    #[test]
    fn stops_at_first_deadline_excess() {
        // 3 + 2 = 5 -> 3 + ceil(5/4)*2 = 7 -> 3 + ceil(7/4)*2 = 7
        let hp = [Interference::new(4, 2)];
        assert_eq!(solve(3, &hp, 10), 7);
        // Same recurrence, but 7 > 6 ends the search.
        assert_eq!(solve(3, &hp, 6), 7);
    }

    #[test]
    fn huge_parameters_saturate_past_the_deadline() {
        let half = u64::MAX / 2 + 1;
        assert_eq!(solve(half, &[Interference::new(1, half)], 10), u64::MAX);

        // Converging iterations saturate too once demand outgrows u64.
        let hp = [Interference::new(1, u64::MAX / 4)];
        assert_eq!(hp[0].demand(8), u64::MAX);
        assert!(solve(1, &hp, u64::MAX - 1) > u64::MAX - 1);
    }

    #[test]
    fn demand_counts_release_at_time_zero() {
        let i = Interference::new(10, 3);
        assert_eq!(i.demand(1), 3);
        assert_eq!(i.demand(10), 3);
        assert_eq!(i.demand(11), 6);
    }
}
