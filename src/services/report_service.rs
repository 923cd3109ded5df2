//! Sales figures for the staff dashboard, aggregated from placed orders.

use std::collections::{BTreeMap, HashMap, HashSet};

use time::{Date, UtcOffset};
use uuid::Uuid;

use crate::{
    dao::{
        booking_store::ShowtimeQuery,
        calendar::{format_date, parse_date},
        models::{FoodEntity, OrderEntity},
    },
    dto::report::{
        AgeTagShare, DailyFoodSales, DailyRevenue, FoodOverview, FoodPrice, FoodQuantity,
        FoodRevenueReport, MonthlyTotal, RevenueReport,
    },
    error::ServiceError,
    services::catalog_service::{load_branch, load_movie, not_found},
    state::SharedState,
};

fn parse_range(from: &str, to: &str) -> Result<(Date, Date), ServiceError> {
    let parse = |field: &str, value: &str| {
        parse_date(value)
            .map_err(|_| ServiceError::InvalidInput(format!("`{field}` must use YYYY-MM-DD")))
    };
    let (from, to) = (parse("from", from)?, parse("to", to)?);
    if to < from {
        return Err(ServiceError::InvalidInput("`to` must not precede `from`".into()));
    }
    Ok((from, to))
}

/// Calendar day of the order in the venue offset.
fn order_day(order: &OrderEntity, offset: UtcOffset) -> Date {
    order.created_at.to_offset(offset).date()
}

fn monthly_totals(orders: &[OrderEntity], year: i32, offset: UtcOffset) -> Vec<MonthlyTotal> {
    let mut months: Vec<MonthlyTotal> = (1..=12u8)
        .map(|month| MonthlyTotal {
            month,
            orders: 0,
            total: 0,
        })
        .collect();

    for order in orders {
        let day = order_day(order, offset);
        if day.year() != year {
            continue;
        }
        let slot = &mut months[usize::from(u8::from(day.month())) - 1];
        slot.orders += 1;
        slot.total += order.total;
    }
    months
}

/// Ticket sales of `orders` placed between `from` and `to`, inclusive.
fn revenue_report<'a>(
    orders: impl IntoIterator<Item = &'a OrderEntity>,
    from: Date,
    to: Date,
    offset: UtcOffset,
) -> RevenueReport {
    let mut days: BTreeMap<Date, (u64, u64)> = BTreeMap::new();
    let mut showtimes = HashSet::new();
    for order in orders {
        let day = order_day(order, offset);
        if !(from..=to).contains(&day) {
            continue;
        }
        let (seats, revenue) = days.entry(day).or_default();
        *seats += order.seat_ids.len() as u64;
        *revenue += order.tickets_total;
        showtimes.insert(order.showtime_id);
    }

    let daily: Vec<DailyRevenue> = days
        .into_iter()
        .map(|(date, (seats, revenue))| DailyRevenue {
            date: format_date(date),
            seats,
            revenue,
        })
        .collect();
    // ties go to the earlier day
    let lowest_day = daily
        .iter()
        .reduce(|best, day| if day.revenue < best.revenue { day } else { best })
        .cloned();
    let highest_day = daily
        .iter()
        .reduce(|best, day| if day.revenue > best.revenue { day } else { best })
        .cloned();

    RevenueReport {
        from: format_date(from),
        to: format_date(to),
        sold_seats: daily.iter().map(|day| day.seats).sum(),
        revenue: daily.iter().map(|day| day.revenue).sum(),
        showtimes: showtimes.len() as u64,
        lowest_day,
        highest_day,
        daily,
    }
}

/// Order count and turnover per month of `year`, January to December.
pub async fn monthly_order_totals(
    state: &SharedState,
    year: i32,
) -> Result<Vec<MonthlyTotal>, ServiceError> {
    let store = state.require_store().await?;
    let orders = store.list_orders(None).await?;
    Ok(monthly_totals(&orders, year, state.config().utc_offset()))
}

pub async fn movie_revenue(
    state: &SharedState,
    movie_id: Uuid,
    from: &str,
    to: &str,
) -> Result<RevenueReport, ServiceError> {
    let (from, to) = parse_range(from, to)?;
    let store = state.require_store().await?;
    load_movie(&store, movie_id).await?;

    let showtimes: HashSet<Uuid> = store
        .list_showtimes(ShowtimeQuery::default().for_movie(movie_id))
        .await?
        .into_iter()
        .map(|showtime| showtime.id)
        .collect();
    let orders = store.list_orders(None).await?;
    Ok(revenue_report(
        orders
            .iter()
            .filter(|order| showtimes.contains(&order.showtime_id)),
        from,
        to,
        state.config().utc_offset(),
    ))
}

pub async fn branch_revenue(
    state: &SharedState,
    branch_id: Uuid,
    from: &str,
    to: &str,
) -> Result<RevenueReport, ServiceError> {
    let (from, to) = parse_range(from, to)?;
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;

    let theaters = store
        .list_theaters(branch_id)
        .await?
        .into_iter()
        .map(|theater| theater.id)
        .collect();
    let showtimes: HashSet<Uuid> = store
        .list_showtimes(ShowtimeQuery::default().in_theaters(theaters))
        .await?
        .into_iter()
        .map(|showtime| showtime.id)
        .collect();
    let orders = store.list_orders(None).await?;
    Ok(revenue_report(
        orders
            .iter()
            .filter(|order| showtimes.contains(&order.showtime_id)),
        from,
        to,
        state.config().utc_offset(),
    ))
}

/// Daily quantity and revenue of one concession item.
pub async fn food_revenue(
    state: &SharedState,
    food_id: Uuid,
    from: &str,
    to: &str,
) -> Result<FoodRevenueReport, ServiceError> {
    let (from, to) = parse_range(from, to)?;
    let store = state.require_store().await?;
    let food = store
        .find_food(food_id)
        .await?
        .ok_or_else(|| not_found("food", food_id))?;
    let offset = state.config().utc_offset();

    let mut days: BTreeMap<Date, (u64, u64)> = BTreeMap::new();
    for order in store.list_orders(None).await? {
        let day = order_day(&order, offset);
        if !(from..=to).contains(&day) {
            continue;
        }
        for line in order.foods.iter().filter(|line| line.food_id == food_id) {
            let (quantity, revenue) = days.entry(day).or_default();
            *quantity += u64::from(line.quantity);
            *revenue += line.line_total;
        }
    }

    let daily: Vec<DailyFoodSales> = days
        .into_iter()
        .map(|(date, (quantity, revenue))| DailyFoodSales {
            date: format_date(date),
            quantity,
            revenue,
        })
        .collect();
    Ok(FoodRevenueReport {
        food_id,
        name: food.name,
        from: format_date(from),
        to: format_date(to),
        quantity: daily.iter().map(|day| day.quantity).sum(),
        revenue: daily.iter().map(|day| day.revenue).sum(),
        daily,
    })
}

/// Best and least selling, priciest and cheapest items of a branch menu.
pub async fn food_overview(
    state: &SharedState,
    branch_id: Uuid,
) -> Result<FoodOverview, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;
    let foods = store.list_foods(branch_id).await?;
    let menu: HashSet<Uuid> = foods.iter().map(|food| food.id).collect();

    let mut quantities: HashMap<Uuid, u64> = HashMap::new();
    let mut revenue = 0;
    for order in store.list_orders(None).await? {
        for line in order.foods.iter().filter(|line| menu.contains(&line.food_id)) {
            *quantities.entry(line.food_id).or_default() += u64::from(line.quantity);
            revenue += line.line_total;
        }
    }

    let mut sold: Vec<FoodQuantity> = foods
        .iter()
        .filter_map(|food| {
            quantities.get(&food.id).map(|&quantity| FoodQuantity {
                food_id: food.id,
                name: food.name.clone(),
                quantity,
            })
        })
        .collect();
    sold.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));

    let price = |food: &FoodEntity| FoodPrice {
        food_id: food.id,
        name: food.name.clone(),
        price: food.price,
    };

    Ok(FoodOverview {
        branch_id,
        best_selling: sold.first().cloned(),
        least_selling: sold.last().cloned(),
        most_expensive: foods.iter().max_by_key(|food| food.price).map(price),
        cheapest: foods.iter().min_by_key(|food| food.price).map(price),
        revenue,
    })
}

/// Catalog split by age tag, alphabetically.
pub async fn age_tag_distribution(state: &SharedState) -> Result<Vec<AgeTagShare>, ServiceError> {
    let store = state.require_store().await?;
    let movies = store.list_movies().await?;
    let total = movies.len() as f64;

    let mut tags: BTreeMap<String, u64> = BTreeMap::new();
    for movie in &movies {
        *tags.entry(movie.age_tag.clone()).or_default() += 1;
    }
    Ok(tags
        .into_iter()
        .map(|(age_tag, count)| AgeTagShare {
            age_tag,
            movies: count,
            percentage: count as f64 * 100.0 / total,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{OffsetDateTime, macros::datetime};

    fn order(showtime_id: Uuid, seats: usize, tickets_total: u64, at: OffsetDateTime) -> OrderEntity {
        OrderEntity {
            id: Uuid::new_v4(),
            showtime_id,
            holder: "alice".into(),
            email: None,
            seat_ids: (0..seats).map(|_| Uuid::new_v4()).collect(),
            foods: Vec::new(),
            tickets_total,
            foods_total: 0,
            total: tickets_total,
            ticket_code: "ABCDEFGHIJ".into(),
            payment_reference: None,
            created_at: at,
        }
    }

    #[test]
    fn revenue_report_groups_by_day_within_range() {
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let orders = [
            order(first, 2, 200, datetime!(2030-03-01 10:00 UTC)),
            order(second, 1, 100, datetime!(2030-03-01 20:00 UTC)),
            order(first, 1, 100, datetime!(2030-03-03 09:00 UTC)),
            order(first, 4, 400, datetime!(2030-03-05 09:00 UTC)),
        ];
        let (from, to) = parse_range("2030-03-01", "2030-03-03").unwrap();

        let report = revenue_report(&orders, from, to, UtcOffset::UTC);
        assert_eq!(report.sold_seats, 4);
        assert_eq!(report.revenue, 400);
        assert_eq!(report.showtimes, 2);
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.highest_day.unwrap().date, "2030-03-01");
        assert_eq!(report.lowest_day.unwrap().date, "2030-03-03");
    }

    #[test]
    fn order_days_follow_the_venue_offset() {
        let late = [order(Uuid::new_v4(), 1, 100, datetime!(2030-03-01 20:00 UTC))];
        let (from, to) = parse_range("2030-03-02", "2030-03-02").unwrap();
        let offset = UtcOffset::from_hms(7, 0, 0).unwrap();

        assert_eq!(revenue_report(&late, from, to, offset).sold_seats, 1);
        assert_eq!(revenue_report(&late, from, to, UtcOffset::UTC).sold_seats, 0);
    }

    #[test]
    fn empty_range_has_no_extremes() {
        let (from, to) = parse_range("2030-01-01", "2030-01-31").unwrap();
        let report = revenue_report(&[], from, to, UtcOffset::UTC);
        assert_eq!(report.revenue, 0);
        assert!(report.lowest_day.is_none());
        assert!(report.highest_day.is_none());
    }

    #[test]
    fn monthly_totals_cover_the_whole_year() {
        let orders = [
            order(Uuid::new_v4(), 1, 100, datetime!(2030-01-15 10:00 UTC)),
            order(Uuid::new_v4(), 1, 250, datetime!(2030-01-20 10:00 UTC)),
            order(Uuid::new_v4(), 1, 300, datetime!(2030-12-31 10:00 UTC)),
            order(Uuid::new_v4(), 1, 999, datetime!(2031-01-01 10:00 UTC)),
        ];
        let months = monthly_totals(&orders, 2030, UtcOffset::UTC);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], MonthlyTotal { month: 1, orders: 2, total: 350 });
        assert_eq!(months[5].total, 0);
        assert_eq!(months[11].total, 300);
    }

    #[test]
    fn reversed_ranges_are_rejected() {
        assert!(matches!(
            parse_range("2030-03-02", "2030-03-01"),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(parse_range("2030-3-1", "2030-03-01").is_err());
    }
}
